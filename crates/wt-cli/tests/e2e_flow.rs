//! End-to-end tests driving the `wt` binary.
//!
//! Each test gets its own HOME, database, and state file.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn wt_binary() -> String {
    env!("CARGO_BIN_EXE_wt").to_string()
}

fn wt(temp: &Path, args: &[&str]) -> Output {
    Command::new(wt_binary())
        .env("HOME", temp)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("RUST_LOG")
        .env("WT_DATABASE_PATH", temp.join("data").join("wt.db"))
        .env("WT_STATE_PATH", temp.join("data").join("session.json"))
        .args(args)
        .output()
        .expect("failed to run wt")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_start_status_stop_flow() {
    let temp = TempDir::new().unwrap();

    let output = wt(temp.path(), &["start", "--at", "2 hours ago"]);
    assert_success(&output, "wt start");
    assert!(stdout(&output).starts_with("Started working at"));
    assert!(temp.path().join("data/session.json").exists());

    let output = wt(temp.path(), &["start"]);
    assert_success(&output, "second wt start");
    assert!(stdout(&output).starts_with("Already working since"));

    let output = wt(temp.path(), &["status", "--json"]);
    assert_success(&output, "wt status");
    let status: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(status["active"], true);
    assert!(status["current_session"].as_i64().unwrap() >= 7_200);
    assert!(status["week"].as_i64().unwrap() >= status["today"].as_i64().unwrap());

    let output = wt(temp.path(), &["stop"]);
    assert_success(&output, "wt stop");
    assert!(stdout(&output).starts_with("Stopped working. Recorded"));
    assert!(!temp.path().join("data/session.json").exists());

    let output = wt(temp.path(), &["stop"]);
    assert_success(&output, "second wt stop");
    assert_eq!(stdout(&output).trim(), "Not working.");

    let output = wt(temp.path(), &["segments"]);
    assert_success(&output, "wt segments");
    assert!(stdout(&output).lines().count() >= 2);

    let output = wt(temp.path(), &["history", "--json"]);
    assert_success(&output, "wt history");
    let months: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(!months.as_array().unwrap().is_empty());

    let output = wt(temp.path(), &["check"]);
    assert_success(&output, "wt check");
}

#[test]
fn test_edit_is_caught_by_check() {
    let temp = TempDir::new().unwrap();

    assert_success(
        &wt(temp.path(), &["start", "--at", "3 hours ago"]),
        "wt start",
    );
    assert_success(&wt(temp.path(), &["stop", "--at", "1 hour ago"]), "wt stop");

    let output = wt(
        temp.path(),
        &["edit", "1", "--start", "3 hours ago", "--stop", "170 minutes ago"],
    );
    assert_success(&output, "wt edit");
    assert!(stdout(&output).starts_with("Updated segment 1"));

    let output = wt(temp.path(), &["check"]);
    assert!(!output.status.success(), "check should report the mismatch");
    assert!(String::from_utf8_lossy(&output.stderr).contains("do not match"));

    assert_success(&wt(temp.path(), &["delete", "1"]), "wt delete");
    assert!(!wt(temp.path(), &["delete", "1"]).status.success());
}

#[test]
fn test_invalid_time_is_rejected() {
    let temp = TempDir::new().unwrap();

    let output = wt(temp.path(), &["start", "--at", "yesterday"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid time"));
    assert!(!temp.path().join("data/session.json").exists());
}

#[test]
fn test_start_before_calendar_range_is_rejected() {
    let temp = TempDir::new().unwrap();

    let output = wt(temp.path(), &["start", "--at=-99999999999999"]);
    assert!(!output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stderr)
            .contains("outside the supported calendar range")
    );
    assert!(!temp.path().join("data/session.json").exists());

    // Nothing was left open, so the tracker is still usable.
    let output = wt(temp.path(), &["stop"]);
    assert_success(&output, "wt stop");
    assert_eq!(stdout(&output).trim(), "Not working.");
    assert_success(&wt(temp.path(), &["start"]), "wt start");
}

#[test]
fn test_config_file_sets_paths() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("custom.toml");
    let db_path = temp.path().join("elsewhere").join("work.db");
    std::fs::write(
        &config_path,
        format!("database_path = {:?}\n", db_path.display().to_string()),
    )
    .unwrap();

    let output = Command::new(wt_binary())
        .env("HOME", temp.path())
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("WT_DATABASE_PATH")
        .env("WT_STATE_PATH", temp.path().join("session.json"))
        .args(["--config", config_path.to_str().unwrap(), "history"])
        .output()
        .unwrap();
    assert_success(&output, "wt history");
    assert_eq!(stdout(&output).trim(), "No work recorded.");
    assert!(db_path.exists());
}
