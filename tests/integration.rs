use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn bugscope_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("bugscope");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    // Create a small repository checkout to index
    let repo_dir = root.join("repo");
    fs::create_dir_all(repo_dir.join("src")).unwrap();
    fs::write(
        repo_dir.join("app.py"),
        "def handle_request(request):\n    return render(request)\n\n".repeat(12),
    )
    .unwrap();
    fs::write(
        repo_dir.join("src/parser.rs"),
        "pub fn parse(input: &str) -> Result<Ast, ParseError> {\n    lex(input)\n}\n".repeat(10),
    )
    .unwrap();
    // Excluded extension: must not be indexed
    fs::write(repo_dir.join("notes.txt"), "scratch notes, not source").unwrap();

    let config_content = format!(
        r#"[workspace]
dir = "{root}/workspace"

[chunking]
max_chunk_size = 400
overlap_size = 50

[retrieval]
top_k = 5

[embedding]
provider = "hashed"
dims = 64

[index]
path = "{root}/vector_store.db"
"#,
        root = root.display()
    );

    let config_path = root.join("bugscope.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_bugscope(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = bugscope_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run bugscope binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn repo_path(config_path: &Path) -> String {
    config_path
        .parent()
        .unwrap()
        .join("repo")
        .to_str()
        .unwrap()
        .to_string()
}

#[test]
fn test_index_build_creates_store() {
    let (_tmp, config_path) = setup_test_env();

    let repo = repo_path(&config_path);
    let (stdout, stderr, success) = run_bugscope(&config_path, &["index", "build", &repo]);
    assert!(success, "build failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Split 2 documents"));
    assert!(stdout.contains("ok"));
    assert!(config_path.parent().unwrap().join("vector_store.db").exists());
}

#[test]
fn test_index_build_skips_existing() {
    let (_tmp, config_path) = setup_test_env();
    let repo = repo_path(&config_path);

    let (_, _, success1) = run_bugscope(&config_path, &["index", "build", &repo]);
    assert!(success1, "first build failed");

    let (stdout, _, success2) = run_bugscope(&config_path, &["index", "build", &repo]);
    assert!(success2, "second build failed");
    assert!(stdout.contains("Skipping build"));
    assert!(stdout.contains("ok (existing index)"));
}

#[test]
fn test_index_build_force_rebuilds() {
    let (_tmp, config_path) = setup_test_env();
    let repo = repo_path(&config_path);

    run_bugscope(&config_path, &["index", "build", &repo]);
    let (stdout, stderr, success) =
        run_bugscope(&config_path, &["index", "build", &repo, "--force"]);
    assert!(success, "forced build failed: {}", stderr);
    assert!(!stdout.contains("Skipping build"));
    assert!(stdout.contains("Indexed"));
}

#[test]
fn test_index_build_fails_without_source_files() {
    let (tmp, config_path) = setup_test_env();

    let empty_repo = tmp.path().join("empty-repo");
    fs::create_dir_all(&empty_repo).unwrap();
    fs::write(empty_repo.join("data.csv"), "a,b,c").unwrap();

    let (stdout, stderr, success) =
        run_bugscope(&config_path, &["index", "build", empty_repo.to_str().unwrap()]);
    assert!(!success, "build should fail: stdout={}", stdout);
    assert!(stderr.contains("no processable source files found"));
}

#[test]
fn test_query_returns_ranked_chunks() {
    let (_tmp, config_path) = setup_test_env();
    let repo = repo_path(&config_path);

    run_bugscope(&config_path, &["index", "build", &repo]);
    let (stdout, stderr, success) =
        run_bugscope(&config_path, &["index", "query", "parse error in request handler"]);
    assert!(success, "query failed: {}", stderr);
    assert!(stdout.contains("1. ["));
    assert!(stdout.contains("excerpt:"));
    // notes.txt was never indexed
    assert!(!stdout.contains("notes.txt"));
}

#[test]
fn test_query_top_k_bounds_results() {
    let (_tmp, config_path) = setup_test_env();
    let repo = repo_path(&config_path);

    run_bugscope(&config_path, &["index", "build", &repo]);
    let (stdout, _, success) =
        run_bugscope(&config_path, &["index", "query", "parse", "--top-k", "2"]);
    assert!(success);
    assert!(stdout.contains("1. ["));
    assert!(stdout.contains("2. ["));
    assert!(!stdout.contains("3. ["));
    assert!(stdout.contains("2 chunks across"));
}

#[test]
fn test_query_rejects_zero_top_k() {
    let (_tmp, config_path) = setup_test_env();
    let repo = repo_path(&config_path);

    run_bugscope(&config_path, &["index", "build", &repo]);
    let (stdout, stderr, success) =
        run_bugscope(&config_path, &["index", "query", "parse", "--top-k", "0"]);
    assert!(!success, "zero top-k should be rejected: {}", stdout);
    assert!(stderr.contains("--top-k must be >= 1"));
}

#[test]
fn test_query_without_index_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_bugscope(&config_path, &["index", "query", "anything"]);
    assert!(!success, "query should fail without an index: {}", stdout);
    assert!(stderr.contains("vector index not found"));
}
