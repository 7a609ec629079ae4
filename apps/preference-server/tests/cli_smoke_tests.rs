#![allow(clippy::unwrap_used, clippy::expect_used)]

//! CLI smoke tests for the preference-server binary.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use tempfile::NamedTempFile;

fn run_preference_server(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_preference-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute preference-server")
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn help_lists_subcommands_and_options() {
    let output = run_preference_server(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("check"));
    assert!(stdout.contains("--config"));
    assert!(stdout.contains("--mock"));
}

#[test]
fn version_is_printed() {
    let output = run_preference_server(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("preference-server"));
}

#[test]
fn missing_config_file_fails() {
    let output = run_preference_server(&["--config", "/nonexistent/config.yaml", "check"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn invalid_config_fails_the_check() {
    let file = config_file("server:\n  bind_addr: [not, a, string\n");
    let output = run_preference_server(&["--config", file.path().to_str().unwrap(), "check"]);
    assert!(!output.status.success());
}

#[test]
fn check_accepts_a_valid_config() {
    let file = config_file(
        r"
server:
  bind_addr: 127.0.0.1:0
preferences:
  access:
    read_scope: cartera.read
",
    );
    let output = run_preference_server(&["--config", file.path().to_str().unwrap(), "check"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration is valid"));
}

#[test]
fn print_config_applies_overrides_and_redacts() {
    let file = config_file(
        r"
preferences:
  auth:
    tokens:
      - token: super-secret-token
        username: adminTEST
",
    );
    let output = run_preference_server(&[
        "--config",
        file.path().to_str().unwrap(),
        "--port",
        "9911",
        "--mock",
        "--print-config",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("9911"));
    assert!(stdout.contains("sqlite::memory:"));
    assert!(stdout.contains("adminTEST"));
    assert!(!stdout.contains("super-secret-token"));
}
