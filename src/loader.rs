//! Source document loader.
//!
//! Walks a repository snapshot, keeps files matching a source-extension
//! allow-list, and reads each one as UTF-8 text tagged with its relative
//! path. Files that fail to read or decode are skipped with a warning;
//! producing zero documents is fatal.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::error::CoreError;
use crate::models::SourceDocument;

/// Extensions for common languages, so the loader focuses on source code
/// and documentation rather than build artifacts and assets.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", // JavaScript/TypeScript
    "py",  // Python
    "java", // Java
    "go",  // Go
    "cs",  // C#
    "rs",  // Rust
    "rb",  // Ruby
    "php", // PHP
    "c", "cpp", "h", "hpp", // C/C++
    "md",  // Markdown
];

/// Default eligibility predicate: the allow-listed extensions above.
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Load all eligible files under `root` using the default predicate.
pub fn load_documents(root: &Path) -> Result<Vec<SourceDocument>> {
    load_documents_with(root, &is_source_file)
}

/// Load all eligible files under `root`, deciding eligibility with the given
/// predicate. Versioning-metadata and dependency subtrees are always skipped.
///
/// Output is sorted by relative path so repeated loads of the same tree are
/// order-stable.
pub fn load_documents_with(
    root: &Path,
    is_eligible: &dyn Fn(&Path) -> bool,
) -> Result<Vec<SourceDocument>> {
    if !root.exists() {
        anyhow::bail!("Scan root does not exist: {}", root.display());
    }

    let exclude_set = build_globset(&[
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ])?;

    let mut documents = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                eprintln!("Warning: could not walk entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }

        if !is_eligible(path) {
            continue;
        }

        // Non-UTF-8 or unreadable files are skipped, not fatal.
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Warning: could not read {}: {}", path.display(), e);
                continue;
            }
        };
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => {
                eprintln!("Warning: {} is not valid UTF-8, skipping", path.display());
                continue;
            }
        };

        documents.push(SourceDocument {
            path: rel_str,
            content,
        });
    }

    documents.sort_by(|a, b| a.path.cmp(&b.path));

    if documents.is_empty() {
        return Err(CoreError::NoSourceFilesFound {
            root: root.to_path_buf(),
        }
        .into());
    }

    Ok(documents)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
