//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_timebank"))
        .env("TIMEBANK_DATA_DIR", dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let (code, stdout, stderr) = run_cli(dir, &full);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    let line = stdout.lines().last().expect("no output");
    serde_json::from_str(line).expect("Failed to parse JSON output")
}

#[test]
fn test_add_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let event = run_json(dir.path(), &["add", "--hours", "1", "--minutes", "30"]);
    assert_eq!(event["type"], "TimeAdded");
    assert_eq!(event["balance"], 5_400);

    let snapshot = run_json(dir.path(), &["status"]);
    assert_eq!(snapshot["type"], "StateSnapshot");
    assert_eq!(snapshot["balance"], 5_400);
    assert_eq!(snapshot["can_undo"], true);
}

#[test]
fn test_human_status_shows_hhmmss() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["add", "--minutes", "75"]);
    let (code, stdout, _) = run_cli(dir.path(), &["status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("01:15:00"), "{stdout}");
}

#[test]
fn test_sub_clamps_and_undo_restores() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["add", "--amount", "100"]);
    let event = run_json(dir.path(), &["sub", "--amount", "250"]);
    assert_eq!(event["balance"], 0);
    assert_eq!(event["clamped"], true);

    let event = run_json(dir.path(), &["undo"]);
    assert_eq!(event["type"], "Undone");
    assert_eq!(event["balance"], 100);
}

#[test]
fn test_undo_with_empty_history_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let event = run_json(dir.path(), &["undo"]);
    assert_eq!(event["type"], "NoOp");
}

#[test]
fn test_invalid_amount_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["add", "--amount", "-5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid amount"), "{stderr}");

    let (code, _, _) = run_cli(dir.path(), &["add"]);
    assert_eq!(code, 1);

    let snapshot = run_json(dir.path(), &["status"]);
    assert_eq!(snapshot["balance"], 0);
    assert_eq!(snapshot["history_len"], 0);
}

#[test]
fn test_strict_overdraft_via_config() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "overdraft", "reject"]);
    assert_eq!(code, 0);
    run_json(dir.path(), &["add", "--amount", "10"]);

    let (code, _, stderr) = run_cli(dir.path(), &["sub", "--amount", "11"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Insufficient balance"), "{stderr}");
}

#[test]
fn test_countdown_start_and_stop() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["add", "--amount", "600"]);

    let event = run_json(dir.path(), &["countdown", "start"]);
    assert_eq!(event["type"], "CountdownStarted");

    let (code, _, stderr) = run_cli(dir.path(), &["add", "--amount", "5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Countdown is active"), "{stderr}");

    let event = run_json(dir.path(), &["countdown", "stop"]);
    assert_eq!(event["type"], "CountdownStopped");

    let event = run_json(dir.path(), &["countdown", "stop"]);
    assert_eq!(event["type"], "NoOp");
}

#[test]
fn test_history_json_lists_entries() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["add", "--amount", "60"]);
    run_json(dir.path(), &["sub", "--amount", "30"]);
    let (code, stdout, _) = run_cli(dir.path(), &["--json", "history"]);
    assert_eq!(code, 0);
    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["type"], "add");
    assert_eq!(entries[1]["type"], "sub");
}

#[test]
fn test_clear_resets_bank() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["add", "--amount", "60"]);
    let snapshot = run_json(dir.path(), &["clear"]);
    assert_eq!(snapshot["balance"], 0);
    assert_eq!(snapshot["history_len"], 0);
}

#[test]
fn test_config_get_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_eq!(code, 1);
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "unit"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "seconds");
}
