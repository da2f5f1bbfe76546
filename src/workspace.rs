//! Workspace management: repository snapshots and cleanup.
//!
//! Clones are shallow and live under the configured workspace directory for
//! the duration of one analysis run. Cleanup is best-effort; failures are
//! warnings so a stuck file never masks the analysis result.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

use crate::config::Config;

/// Shallow-clone `repo_url` into `dest`, reusing an existing checkout.
pub fn clone_repo(repo_url: &str, dest: &Path) -> Result<()> {
    if dest.exists() {
        println!("Repository already exists at {}. Using existing.", dest.display());
        return Ok(());
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    println!("Cloning repository {} to {}...", repo_url, dest.display());
    let output = Command::new("git")
        .args(["clone", "--depth", "1", repo_url])
        .arg(dest)
        .output()
        .context("Failed to run git — is it installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git clone failed for {}: {}", repo_url, stderr.trim());
    }

    Ok(())
}

/// Remove the workspace directory and the persisted index between runs.
pub fn clean_workspace(config: &Config) {
    println!("Cleaning up workspace and vector store...");

    let dir = &config.workspace.dir;
    if dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(dir) {
            eprintln!("Warning: could not clean up {}: {}", dir.display(), e);
        }
    }

    let index_path = &config.index.path;
    if index_path.exists() {
        if let Err(e) = crate::index::discard_index(index_path) {
            eprintln!("Warning: could not remove {}: {}", index_path.display(), e);
        }
    }

    println!("Cleanup complete.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_clone_reuses_existing_checkout() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("repo");
        fs::create_dir_all(&dest).unwrap();

        // An existing directory short-circuits before git runs.
        clone_repo("https://github.com/nonexistent/nonexistent", &dest).unwrap();
    }

    #[test]
    fn test_clean_workspace_removes_dir_and_index() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.workspace.dir = tmp.path().join("workspace");
        config.index.path = tmp.path().join("vector_store.db");

        fs::create_dir_all(config.workspace.dir.join("repo")).unwrap();
        fs::write(config.workspace.dir.join("repo/a.py"), "x").unwrap();
        fs::write(&config.index.path, "stub").unwrap();

        clean_workspace(&config);
        assert!(!config.workspace.dir.exists());
        assert!(!config.index.path.exists());
    }

    #[test]
    fn test_clean_workspace_tolerates_missing_paths() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.workspace.dir = tmp.path().join("never-created");
        config.index.path = tmp.path().join("never-created.db");

        clean_workspace(&config);
    }
}
