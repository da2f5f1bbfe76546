//! # bugscope CLI
//!
//! Analyze GitHub issues against the repository they were filed on.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `bugscope analyze <repo_url> <issue>` | Classify an issue and, if it is a bug, generate a root-cause report |
//! | `bugscope index build <repo_path>` | Build (or skip, if present) the vector index over a checkout |
//! | `bugscope index query "<text>"` | Run a retrieval query against the persisted index |
//!
//! ## Examples
//!
//! ```bash
//! # Full pipeline against a public repository
//! bugscope analyze https://github.com/gothinkster/realworld 1647
//!
//! # Build the index over a local checkout, then poke at retrieval
//! bugscope index build ./workspace/realworld
//! bugscope index query "comments not saving" --top-k 3
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use bugscope::analyze;
use bugscope::config;
use bugscope::context;
use bugscope::index::{self, BuildOutcome};
use bugscope::retriever::Retriever;

/// bugscope — AI-assisted GitHub bug analysis.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; defaults apply when the file does not exist. See
/// `config/bugscope.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "bugscope",
    about = "AI-assisted GitHub bug analysis: issue triage, semantic code retrieval, and LLM root-cause reports",
    version,
    long_about = "bugscope fetches a GitHub issue, classifies it, and — for bugs — retrieves \
    semantically relevant source snippets from a clone of the repository to ground a language-model \
    root-cause analysis and patch suggestion."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./bugscope.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis pipeline for one issue.
    ///
    /// Classifies the issue first; non-bugs stop early without cloning
    /// anything. For bugs: clone, index, retrieve, and generate the report.
    Analyze {
        /// Full URL of the GitHub repository (e.g. https://github.com/gothinkster/realworld).
        repo_url: String,

        /// Issue number to analyze (e.g. 1647).
        issue_number: u64,

        /// Discard any existing index and rebuild it from the fresh clone.
        #[arg(long)]
        force_rebuild: bool,

        /// Keep the cloned repository and index after the run.
        #[arg(long)]
        keep_workspace: bool,
    },

    /// Build or query the vector index directly.
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
}

/// Index management subcommands.
#[derive(Subcommand)]
enum IndexAction {
    /// Index a local repository checkout.
    ///
    /// Skips the build when an index already exists at the configured
    /// storage path; pass --force to discard it and rebuild.
    Build {
        /// Root of the checkout to index.
        repo_path: PathBuf,

        /// Discard any existing index before building.
        #[arg(long)]
        force: bool,
    },

    /// Query the persisted index and print ranked chunks.
    Query {
        /// Free-text query (for issues: title and body).
        text: String,

        /// Override the configured number of results.
        #[arg(long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Analyze {
            repo_url,
            issue_number,
            force_rebuild,
            keep_workspace,
        } => {
            analyze::run_analysis(&cfg, &repo_url, issue_number, force_rebuild, keep_workspace)
                .await?;
        }
        Commands::Index { action } => match action {
            IndexAction::Build { repo_path, force } => {
                match index::ensure_index(&cfg, &repo_path, force).await? {
                    BuildOutcome::Built(_) => println!("ok"),
                    BuildOutcome::SkippedExisting(_) => println!("ok (existing index)"),
                }
            }
            IndexAction::Query { text, top_k } => {
                if let Some(k) = top_k {
                    if k == 0 {
                        anyhow::bail!("--top-k must be >= 1");
                    }
                    cfg.retrieval.top_k = k;
                }
                let vector_index = index::load_for_query(&cfg).await?;
                let retriever = Retriever::new(vector_index, &cfg)?;
                let results = retriever.query(&text).await?;

                if results.is_empty() {
                    println!("No results.");
                    return Ok(());
                }

                for (i, result) in results.iter().enumerate() {
                    let excerpt: String = result.chunk.text.chars().take(240).collect();
                    println!(
                        "{}. [{:.4}] {} (chunk {})",
                        i + 1,
                        result.distance,
                        result.chunk.source_path,
                        result.chunk.sequence_index
                    );
                    println!("    excerpt: \"{}\"", excerpt.replace('\n', " "));
                    println!();
                }

                let contexts = context::assemble_context(&results);
                println!("{} chunks across {} files.", results.len(), contexts.len());
            }
        },
    }

    Ok(())
}
