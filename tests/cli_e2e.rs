//! End-to-end CLI tests for the bulkfetch binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds the binary command with an isolated config directory.
fn bulkfetch(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bulkfetch").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home).env_remove("RUST_LOG");
    cmd
}

/// Starts a mock server serving `/a.txt` and `/b.txt`.
fn start_server(runtime: &tokio::runtime::Runtime) -> MockServer {
    runtime.block_on(async {
        let server = MockServer::start().await;
        for (name, body) in [("/a.txt", "alpha"), ("/b.txt", "bravo")] {
            Mock::given(method("GET"))
                .and(path(name))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .mount(&server)
                .await;
        }
        server
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[test]
fn test_binary_help_displays_usage() {
    let temp = TempDir::new().unwrap();
    bulkfetch(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Concurrently download"))
        .stdout(predicate::str::contains("--skip-existing"));
}

#[test]
fn test_binary_version_displays_version() {
    let temp = TempDir::new().unwrap();
    bulkfetch(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bulkfetch"));
}

#[test]
fn test_binary_invalid_flag_exits_with_usage_error() {
    let temp = TempDir::new().unwrap();
    bulkfetch(temp.path())
        .arg("--invalid-flag")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_without_sources_exits_zero() {
    let temp = TempDir::new().unwrap();
    bulkfetch(temp.path())
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No URLs provided."));
    assert!(!temp.path().join("downloaded").exists());
}

#[test]
fn test_binary_downloads_literal_urls() {
    let runtime = runtime();
    let server = start_server(&runtime);
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");

    bulkfetch(temp.path())
        .arg("--urls")
        .arg(format!("{}/a.txt", server.uri()))
        .arg(format!("{}/b.txt", server.uri()))
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Download complete"));

    assert_eq!(std::fs::read_to_string(out.join("a.txt")).unwrap(), "alpha");
    assert_eq!(std::fs::read_to_string(out.join("b.txt")).unwrap(), "bravo");
}

#[test]
fn test_binary_reads_stdin() {
    let runtime = runtime();
    let server = start_server(&runtime);
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");

    bulkfetch(temp.path())
        .args(["--stdin", "-q", "-o"])
        .arg(&out)
        .write_stdin(format!("{0}/a.txt\n\n{0}/b.txt\n", server.uri()))
        .assert()
        .success();

    assert!(out.join("a.txt").exists());
    assert!(out.join("b.txt").exists());
}

#[test]
fn test_binary_partial_failure_still_exits_zero() {
    let runtime = runtime();
    let server = start_server(&runtime);
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");

    bulkfetch(temp.path())
        .arg("--urls")
        .arg(format!("{}/a.txt", server.uri()))
        .arg(format!("{}/missing.txt", server.uri()))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("a.txt").exists());
    assert!(!out.join("missing.txt").exists());
}

#[test]
fn test_binary_uses_config_file_output_dir() {
    let runtime = runtime();
    let server = start_server(&runtime);
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join("bulkfetch");
    std::fs::create_dir_all(&config_dir).unwrap();
    let out = temp.path().join("from-config");
    std::fs::write(
        config_dir.join("config.toml"),
        format!("out = {:?}\npreserve_path = true\n", out.display().to_string()),
    )
    .unwrap();

    bulkfetch(temp.path())
        .arg("--urls")
        .arg(format!("{}/a.txt", server.uri()))
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(out.join("a.txt")).unwrap(), "alpha");
}

#[test]
fn test_binary_cli_overrides_config_file() {
    let runtime = runtime();
    let server = start_server(&runtime);
    let temp = TempDir::new().unwrap();
    let config_file = temp.path().join("custom.toml");
    std::fs::write(&config_file, "out = \"ignored\"\nconsumers = 2\n").unwrap();
    let out = temp.path().join("cli-out");

    bulkfetch(temp.path())
        .current_dir(temp.path())
        .arg("--config")
        .arg(&config_file)
        .arg("-o")
        .arg(&out)
        .arg("--urls")
        .arg(format!("{}/b.txt", server.uri()))
        .assert()
        .success();

    assert!(out.join("b.txt").exists());
    assert!(!temp.path().join("ignored").exists());
}

#[test]
fn test_binary_invalid_config_exits_one() {
    let temp = TempDir::new().unwrap();
    let config_file = temp.path().join("bad.toml");
    std::fs::write(&config_file, "producers = 0\n").unwrap();

    bulkfetch(temp.path())
        .arg("--config")
        .arg(&config_file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("producers"));
}

#[test]
fn test_binary_unknown_config_key_exits_one() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join("bulkfetch");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "concurrency = 4\n").unwrap();

    bulkfetch(temp.path()).assert().code(1);
}

#[test]
fn test_binary_missing_explicit_config_exits_one() {
    let temp = TempDir::new().unwrap();
    bulkfetch(temp.path())
        .arg("--config")
        .arg(temp.path().join("absent.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("absent.toml"));
}

#[test]
fn test_binary_quiet_flag_suppresses_info() {
    let temp = TempDir::new().unwrap();
    bulkfetch(temp.path())
        .current_dir(temp.path())
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("No URLs provided.").not());
}
