use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn rdx_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rdx"))
}

fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, body) in entries {
        zip.start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn setup_test_env(extra_sources: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let archives = root.join("config").join("archives");
    fs::create_dir_all(&archives).unwrap();
    write_zip(
        &archives.join("repoA.zip"),
        &[
            ("repoA-main/readme.md", "Repo A readme"),
            (
                "repoA-main/guide/setup.md",
                "Setup guide. Install the tool, then run setup.",
            ),
            ("repoA-main/notes.txt", "not indexed"),
        ],
    );
    write_zip(
        &archives.join("repoB.zip"),
        &[("repoB-main/readme.md", "Repo B readme")],
    );

    let config_content = format!(
        r#"[storage]
data_dir = "{}/data"

[search]
snippet_length = 40
max_top_k = 10

[sources.repoA]
path = "archives/repoA.zip"

[sources.repoB]
path = "archives/repoB.zip"
{}
"#,
        root.display(),
        extra_sources
    );

    let config_path = root.join("config").join("rdx.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_rdx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = rdx_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run rdx binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_sources_lists_configured() {
    let (_tmp, config_path) = setup_test_env("");
    let (stdout, stderr, success) = run_rdx(&config_path, &["sources"]);
    assert!(success, "sources failed: {}", stderr);
    assert!(stdout.contains("repoA"));
    assert!(stdout.contains("repoB"));
    assert!(stdout.contains("true"));
}

#[test]
fn test_sync_reports_counts() {
    let (_tmp, config_path) = setup_test_env("");
    let (stdout, stderr, success) = run_rdx(&config_path, &["sync"]);
    assert!(success, "sync failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("repoA: 2 documents"));
    assert!(stdout.contains("repoB: 1 documents"));
    assert!(stdout.contains("indexed 3 documents from 2 sources"));
}

#[test]
fn test_sync_fails_but_keeps_good_sources() {
    let (_tmp, config_path) = setup_test_env("\n[sources.zzz]\npath = \"archives/missing.zip\"\n");
    let (stdout, stderr, success) = run_rdx(&config_path, &["sync"]);
    assert!(!success);
    assert!(stdout.contains("indexed 3 documents from 2 sources"));
    assert!(stderr.contains("zzz: FAILED"));
}

#[test]
fn test_search_finds_setup_guide() {
    let (_tmp, config_path) = setup_test_env("");
    let (stdout, stderr, success) = run_rdx(&config_path, &["search", "setup", "--top-k", "3"]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("1. ["));
    assert!(stdout.contains("repoA / guide/setup.md"));
    assert!(stdout.contains("Setup guide. Install the tool, then run"));
}

#[test]
fn test_search_rejects_zero_top_k() {
    let (_tmp, config_path) = setup_test_env("");
    let (_, stderr, success) = run_rdx(&config_path, &["search", "setup", "--top-k", "0"]);
    assert!(!success);
    assert!(stderr.contains("--top-k"));
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env("");
    let (stdout, _, success) = run_rdx(&config_path, &["search", "kubernetes"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_read_ambiguous_lists_sources() {
    let (_tmp, config_path) = setup_test_env("");
    let (_, stderr, success) = run_rdx(&config_path, &["read", "readme.md"]);
    assert!(!success);
    assert!(stderr.contains("repoA, repoB"), "stderr: {}", stderr);
}

#[test]
fn test_read_with_source() {
    let (_tmp, config_path) = setup_test_env("");
    let (stdout, stderr, success) =
        run_rdx(&config_path, &["read", "readme.md", "--source", "repoB"]);
    assert!(success, "read failed: {}", stderr);
    assert_eq!(stdout.trim(), "Repo B readme");

    let (stdout, _, success) = run_rdx(&config_path, &["read", "guide/setup.md"]);
    assert!(success);
    assert!(stdout.starts_with("Setup guide."));
}

#[test]
fn test_read_missing_file() {
    let (_tmp, config_path) = setup_test_env("");
    let (_, stderr, success) = run_rdx(&config_path, &["read", "notes.txt"]);
    assert!(!success);
    assert!(stderr.contains("not found"), "stderr: {}", stderr);
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_rdx(&tmp.path().join("nope.toml"), &["sources"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_scrape_rejects_non_http_without_config() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_rdx(&tmp.path().join("nope.toml"), &["scrape", "ftp://x"]);
    assert!(!success);
    assert!(stderr.contains("http"));
}

#[test]
fn test_scrape_reports_broken_config() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("rdx.toml");
    fs::write(&config_path, "[search\nsnippet_length = ").unwrap();
    let (_, stderr, success) = run_rdx(&config_path, &["scrape", "https://example.com"]);
    assert!(!success);
    assert!(stderr.contains("Failed to parse config file"), "stderr: {}", stderr);
}
