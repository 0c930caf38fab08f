//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway config file.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(config: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_windowminder"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_config_path_echoes_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let (stdout, _, code) = run_cli(&config, &["config", "path"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), config.display().to_string());
}

#[test]
fn test_config_get_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let (stdout, _, code) = run_cli(&config, &["config", "get", "required_open_seconds_per_hour"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "300");
    assert!(config.exists());
}

#[test]
fn test_config_set_persists() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let (_, _, code) = run_cli(&config, &["config", "set", "server.port", "9090"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(&config, &["config", "get", "server.port"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "9090");
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let (_, stderr, code) = run_cli(&config, &["config", "set", "server.nope", "1"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
}

#[test]
fn test_receivers_list_marks_rejected_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        "[receivers.das-keyboard]\neffect_needs_open = \"SPARKLE\"\n",
    )
    .unwrap();

    let (stdout, _, code) = run_cli(&config, &["receivers"]);
    assert_eq!(code, 0);
    let das = stdout
        .lines()
        .find(|l| l.starts_with("das-keyboard"))
        .expect("das-keyboard listed");
    assert!(das.contains("disabled"), "line: {das}");
    let log = stdout.lines().find(|l| l.starts_with("log")).expect("log listed");
    assert!(log.contains("active"), "line: {log}");
}

#[test]
fn test_receivers_list_marks_switched_off_receiver() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[receivers.log]\nenabled = false\n").unwrap();

    let (stdout, _, code) = run_cli(&config, &["receivers"]);
    assert_eq!(code, 0);
    let log = stdout.lines().find(|l| l.starts_with("log")).expect("log listed");
    assert!(log.contains("disabled (enabled = false)"), "line: {log}");
}

#[test]
fn test_config_set_creates_receiver_setting() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let key = "receivers.das-keyboard.color_enough_open";

    let (_, stderr, code) = run_cli(&config, &["config", "set", key, "#00FF00"]);
    assert_eq!(code, 0, "stderr: {stderr}");

    let (stdout, _, code) = run_cli(&config, &["config", "get", key]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "#00FF00");

    let (stdout, _, code) = run_cli(&config, &["receivers"]);
    assert_eq!(code, 0);
    let das = stdout
        .lines()
        .find(|l| l.starts_with("das-keyboard"))
        .expect("das-keyboard listed");
    assert!(das.contains("configured, active"), "line: {das}");
}
