use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn mdh_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("mdh");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let files_dir = root.join("files");
    fs::create_dir_all(files_dir.join("guides")).unwrap();
    fs::write(
        files_dir.join("alpha.md"),
        "# Alpha Document\n\nThis is the alpha document about Rust programming.\n\nIt contains information about cargo and crates.",
    )
    .unwrap();
    fs::write(
        files_dir.join("beta.md"),
        "# Beta Document\n\nThis document discusses Python and machine learning.\n\nDeep learning frameworks like PyTorch are covered.",
    )
    .unwrap();
    fs::write(
        files_dir.join("guides/deploy.md"),
        "# Deploy\n\nOverview of deployment.\n\n## Setup\n\nRun `install.sh` to begin setup.\n\n### Linux\n\nUse apt to install packages.\n\n## Rollback\n\nRevert the release.\n",
    )
    .unwrap();
    fs::write(files_dir.join("image.png"), [0u8, 1, 2, 3]).unwrap();

    let config_content = format!(
        r#"[corpus]
root = "{}/files"
include_globs = ["**/*.md", "**/*.txt"]
exclude_globs = []

[chunking]
max_chunk_size = 1000

[retrieval]
strategy = "keyword"
max_results = 5
"#,
        root.display()
    );

    let config_path = root.join("mdh.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_mdh(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = mdh_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run mdh binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_keyword_search() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_mdh(&config_path, &["search", "cargo"]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("Found 1 snippet(s) for 'cargo' [keyword]"), "stdout: {}", stdout);
    assert!(stdout.contains("alpha.md"));
    assert!(stdout.contains("Section: Alpha Document"));
    assert!(!stdout.contains("beta.md"));
}

#[test]
fn test_search_reports_nested_section() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_mdh(&config_path, &["search", "setup"]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("guides/deploy.md"));
    assert!(stdout.contains("Section: Deploy > Setup"));
    assert!(stdout.contains("install.sh"));
}

#[test]
fn test_search_json_output() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) =
        run_mdh(&config_path, &["search", "learning", "--json", "--limit", "3"]);
    assert!(success, "search failed: {}", stderr);

    let results: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["source_id"], "beta.md");
    assert_eq!(results[0]["header_path"], "Beta Document");
    assert!(results[0]["score"].as_f64().unwrap() > 0.0);
    assert!(results[0]["snippet"].as_str().unwrap().contains("learning"));
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _stderr, success) = run_mdh(&config_path, &["search", "xyznonexistent"]);
    assert!(success);
    assert!(stdout.contains("No results found"));
}

#[test]
fn test_semantic_search_without_provider_fails() {
    let (_tmp, config_path) = setup_test_env();

    for strategy in ["semantic", "hybrid"] {
        let (_stdout, stderr, success) =
            run_mdh(&config_path, &["search", "rust", "--strategy", strategy]);
        assert!(!success, "{} should fail without a provider", strategy);
        assert!(stderr.contains("keyword"), "stderr: {}", stderr);
    }
}

#[test]
fn test_invalid_strategy_rejected() {
    let (_tmp, config_path) = setup_test_env();

    let (_stdout, stderr, success) =
        run_mdh(&config_path, &["search", "rust", "--strategy", "fuzzy"]);
    assert!(!success);
    assert!(stderr.contains("fuzzy"));
}

#[test]
fn test_list_command() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_mdh(&config_path, &["list"]);
    assert!(success, "list failed: {}", stderr);
    assert!(stdout.contains("3 document(s)"), "stdout: {}", stdout);
    assert!(stdout.contains("- alpha.md"));
    assert!(stdout.contains("- guides/deploy.md"));
    assert!(stdout.contains("  Alpha Document"));
    assert!(!stdout.contains("image.png"));

    let (stdout, stderr, success) = run_mdh(&config_path, &["list", "--json"]);
    assert!(success, "list --json failed: {}", stderr);
    let listed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[1]["source_id"], "beta.md");
    assert_eq!(listed[1]["description"], "Beta Document");
}

#[test]
fn test_read_command() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_mdh(&config_path, &["read", "guides/deploy.md"]);
    assert!(success, "read failed: {}", stderr);
    let expected = fs::read_to_string(tmp.path().join("files/guides/deploy.md")).unwrap();
    assert_eq!(stdout, expected);

    let (_stdout, stderr, success) = run_mdh(&config_path, &["read", "missing.md"]);
    assert!(!success);
    assert!(stderr.contains("document not found"));
}

#[test]
fn test_chunks_command() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_mdh(&config_path, &["chunks", "guides/deploy.md"]);
    assert!(success, "chunks failed: {}", stderr);
    assert!(stdout.contains("guides/deploy.md (4 chunks)"), "stdout: {}", stdout);
    assert!(stdout.contains("[chunk 0] Deploy (0.."));
    assert!(stdout.contains("[chunk 2] Deploy > Setup > Linux"));
    assert!(stdout.contains("[chunk 3] Deploy > Rollback"));
}

#[test]
fn test_chunks_unknown_document() {
    let (_tmp, config_path) = setup_test_env();

    let (_stdout, stderr, success) = run_mdh(&config_path, &["chunks", "missing.md"]);
    assert!(!success);
    assert!(stderr.contains("document not found"));
}

#[test]
fn test_section_command() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) =
        run_mdh(&config_path, &["section", "guides/deploy.md", "Setup"]);
    assert!(success, "section failed: {}", stderr);
    assert!(stdout.contains("install.sh"));
    assert!(stdout.contains("Use apt"));
    assert!(!stdout.contains("Revert the release"));

    let (_stdout, stderr, success) =
        run_mdh(&config_path, &["section", "guides/deploy.md", "Nowhere"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_index_without_provider_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (_stdout, stderr, success) = run_mdh(&config_path, &["index"]);
    assert!(!success);
    assert!(stderr.contains("embedding backend"));
}

#[test]
fn test_root_override_without_config_file() {
    let (tmp, _config_path) = setup_test_env();
    let workdir = TempDir::new().unwrap();

    let output = Command::new(mdh_binary())
        .current_dir(workdir.path())
        .arg("--root")
        .arg(tmp.path().join("files"))
        .args(["search", "pytorch"])
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("beta.md"));
}

#[test]
fn test_missing_config_file_fails() {
    let (tmp, _config_path) = setup_test_env();

    let (_stdout, stderr, success) =
        run_mdh(&tmp.path().join("nope.toml"), &["search", "rust"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_completions() {
    let output = Command::new(mdh_binary())
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("mdh"));
}
