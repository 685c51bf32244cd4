//! E2E CLI tests covering the task commands:
//! - `jot add` / `jot toggle` / `jot list` in every output mode
//! - persistence across invocations
//! - `jot watch --count`, including writes from a second process
//! - error codes for missing tasks, bad config and newer schemas
//!
//! Each test runs the `jot` binary as a subprocess against a database in an
//! isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::Stdio;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the jot binary with its state confined to `dir`.
fn jot_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jot"));
    cmd.current_dir(dir);
    cmd.env("JOT_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd.arg("--db").arg(dir.join("jot.sqlite3"));
    cmd.arg("--config").arg(dir.join("config.toml"));
    cmd
}

/// Add a task via CLI and return its JSON record.
fn add_task(dir: &Path, text: &str) -> Value {
    let output = jot_cmd(dir)
        .args(["add", text, "--json"])
        .output()
        .expect("add should not crash");
    assert!(
        output.status.success(),
        "add failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("add --json should produce valid JSON")
}

fn list_json(dir: &Path) -> Vec<Value> {
    let output = jot_cmd(dir)
        .args(["list", "--json"])
        .output()
        .expect("list should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    json.as_array().expect("list --json is an array").clone()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn add_returns_a_fresh_open_task() {
    let dir = TempDir::new().expect("temp dir");
    let first = add_task(dir.path(), "buy milk");
    let second = add_task(dir.path(), "call mom");

    assert_eq!(first["text"], "buy milk");
    assert_eq!(first["is_completed"], false);
    assert!(second["id"].as_i64() > first["id"].as_i64());
}

#[test]
fn add_stores_text_verbatim_including_empty() {
    let dir = TempDir::new().expect("temp dir");
    add_task(dir.path(), "");
    add_task(dir.path(), "  padded  ");

    let tasks = list_json(dir.path());
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["text"], "");
    assert_eq!(tasks[1]["text"], "  padded  ");
}

#[test]
fn list_is_ordered_by_id_and_persists() {
    let dir = TempDir::new().expect("temp dir");
    for text in ["a", "b", "c"] {
        add_task(dir.path(), text);
    }

    let tasks = list_json(dir.path());
    let texts: Vec<&str> = tasks.iter().filter_map(|t| t["text"].as_str()).collect();
    assert_eq!(texts, ["a", "b", "c"]);
    assert!(dir.path().join("jot.sqlite3").exists());
}

#[test]
fn toggle_twice_restores_the_task() {
    let dir = TempDir::new().expect("temp dir");
    let task = add_task(dir.path(), "walk dog");
    let id = task["id"].to_string();

    let output = jot_cmd(dir.path())
        .args(["toggle", &id, "--json"])
        .output()
        .expect("toggle should not crash");
    assert!(output.status.success());
    let toggled: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(toggled["is_completed"], true);
    assert_eq!(toggled["text"], "walk dog");

    jot_cmd(dir.path()).args(["toggle", &id]).assert().success();
    assert_eq!(list_json(dir.path()), vec![task]);
}

#[test]
fn toggle_unknown_id_reports_not_found() {
    let dir = TempDir::new().expect("temp dir");
    add_task(dir.path(), "only one");

    jot_cmd(dir.path())
        .args(["toggle", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"))
        .stderr(predicate::str::contains("no task with id 99"));

    let tasks = list_json(dir.path());
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["is_completed"], false);
}

#[test]
fn toggle_unknown_id_json_error() {
    let dir = TempDir::new().expect("temp dir");
    let output = jot_cmd(dir.path())
        .args(["toggle", "5", "--json"])
        .output()
        .expect("toggle should not crash");
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stderr).expect("JSON error on stderr");
    assert_eq!(json["error"]["error_code"], "E2001");
}

#[test]
fn text_list_has_header_and_states() {
    let dir = TempDir::new().expect("temp dir");
    let task = add_task(dir.path(), "first");
    add_task(dir.path(), "second");
    jot_cmd(dir.path())
        .args(["toggle", &task["id"].to_string()])
        .assert()
        .success();

    jot_cmd(dir.path())
        .args(["list", "--format", "text"])
        .assert()
        .success()
        .stdout("ID  STATE  TEXT\n1  done  first\n2  open  second\n");
}

#[test]
fn pretty_list_summarises() {
    let dir = TempDir::new().expect("temp dir");
    jot_cmd(dir.path())
        .args(["list", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tasks (0, 0 done)"))
        .stdout(predicate::str::contains("No tasks yet"));
}

#[test]
fn format_env_selects_output_mode() {
    let dir = TempDir::new().expect("temp dir");
    add_task(dir.path(), "env");
    let output = jot_cmd(dir.path())
        .env("FORMAT", "json")
        .arg("list")
        .output()
        .expect("list should not crash");
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json[0]["text"], "env");
}

#[test]
fn watch_count_one_prints_the_initial_snapshot() {
    let dir = TempDir::new().expect("temp dir");
    add_task(dir.path(), "seen by watch");

    let output = jot_cmd(dir.path())
        .args(["watch", "--count", "1", "--json"])
        .timeout(Duration::from_secs(30))
        .output()
        .expect("watch should not crash");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert_eq!(stdout.lines().count(), 1);
    let line: Value = serde_json::from_str(stdout.trim()).expect("valid JSON line");
    assert_eq!(line["revision"], 0);
    assert_eq!(line["tasks"][0]["text"], "seen by watch");
}

#[test]
fn watch_sees_tasks_added_by_another_process() {
    let dir = TempDir::new().expect("temp dir");
    add_task(dir.path(), "first");

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin!("jot"))
        .current_dir(dir.path())
        .env("JOT_LOG", "error")
        .env_remove("FORMAT")
        .arg("--db")
        .arg(dir.path().join("jot.sqlite3"))
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .args(["watch", "--count", "2", "--json"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn watch");

    let stdout = child.stdout.take().expect("piped stdout");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    let mut next_line = || {
        rx.recv_timeout(Duration::from_secs(30)).unwrap_or_else(|_| {
            let _ = child.kill();
            panic!("watch printed nothing within 30s");
        })
    };

    let initial: Value = serde_json::from_str(&next_line()).expect("valid JSON line");
    assert_eq!(initial["tasks"].as_array().map(Vec::len), Some(1));

    add_task(dir.path(), "second");
    let changed: Value = serde_json::from_str(&next_line()).expect("valid JSON line");
    assert_eq!(changed["revision"], 1);
    assert_eq!(changed["tasks"][0]["text"], "first");
    assert_eq!(changed["tasks"][1]["text"], "second");

    let status = child.wait().expect("watch exits");
    assert!(status.success(), "watch --count 2 should exit cleanly");
}

#[test]
fn bad_config_is_a_parse_error() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("config.toml"), "[profile\nhandle = ").expect("write config");

    jot_cmd(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"));
}

#[test]
fn newer_schema_is_refused() {
    let dir = TempDir::new().expect("temp dir");
    add_task(dir.path(), "written by this version");

    let conn = rusqlite::Connection::open(dir.path().join("jot.sqlite3")).expect("open db");
    conn.pragma_update(None, "user_version", 99_i64)
        .expect("stamp version");
    drop(conn);

    jot_cmd(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("E3002"));
}

#[test]
fn completions_mention_the_binary() {
    let dir = TempDir::new().expect("temp dir");
    jot_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jot"));
}
