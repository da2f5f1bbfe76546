//! End-to-end issue analysis pipeline.
//!
//! A straight sequence of handoffs: classify → clone → index → retrieve →
//! assemble → generate → report. Retrieval grounds the language model in the
//! actual source of the repository the issue was filed against. The
//! workspace and index are discarded after the run unless the caller asks to
//! keep them.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::context;
use crate::github::{self, IssueDetails};
use crate::index;
use crate::llm;
use crate::retriever::Retriever;
use crate::workspace;

pub async fn run_analysis(
    config: &Config,
    repo_url: &str,
    issue_number: u64,
    force_rebuild: bool,
    keep_workspace: bool,
) -> Result<()> {
    println!("Checking for Ollama model: {}...", config.llm.model);
    if !llm::check_model(&config.llm).await? {
        bail!(
            "Model '{}' not found. Run `ollama pull {}` first.",
            config.llm.model,
            config.llm.model
        );
    }

    let (owner, repo_name) = github::parse_github_url(repo_url)?;
    let issue = github::fetch_issue(&owner, &repo_name, issue_number).await?;

    println!("Step 1: Classifying issue type...");
    let issue_type = llm::classify_issue(&config.llm, &issue).await?;
    println!("Issue classified as: {}", issue_type);

    if issue_type != "BUG" {
        println!(
            "Analysis complete. Issue is a '{}', not a bug. No fix required.",
            issue_type
        );
        return Ok(());
    }

    println!("Issue is a BUG. Proceeding with full analysis...");
    let repo_path = config.workspace.dir.join(&repo_name);
    let result = analyze_bug(config, repo_url, &repo_path, &issue, force_rebuild).await;

    // Cleanup runs whether or not the analysis succeeded.
    if keep_workspace {
        println!("Keeping workspace at {} as requested.", repo_path.display());
    } else {
        workspace::clean_workspace(config);
    }

    let report = result?;

    let rule = "=".repeat(80);
    println!("\n{}", rule);
    println!(
        " BUG ANALYSIS REPORT FOR: {} - Issue #{}",
        repo_url, issue_number
    );
    println!("{}\n", rule);
    println!("Issue URL: {}\n", issue.url);
    println!("{}", report);
    println!("\n{}", rule);

    Ok(())
}

async fn analyze_bug(
    config: &Config,
    repo_url: &str,
    repo_path: &std::path::Path,
    issue: &IssueDetails,
    force_rebuild: bool,
) -> Result<String> {
    workspace::clone_repo(repo_url, repo_path)?;

    let vector_index = index::ensure_index(config, repo_path, force_rebuild)
        .await?
        .into_index();
    let retriever = Retriever::new(vector_index, config)?;

    println!("Finding relevant code context...");
    let query = format!("Title: {}\n\nBody: {}", issue.title, issue.body);
    let results = retriever.query(&query).await?;
    let contexts = context::assemble_context(&results);
    println!(
        "Found {} relevant chunks across {} files.",
        results.len(),
        contexts.len()
    );

    println!("Step 2: Generating full bug analysis...");
    llm::generate_analysis(&config.llm, issue, &contexts).await
}
