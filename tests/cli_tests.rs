//! Integration tests for the deploy-view CLI
//!
//! These tests run the actual binary. Stdout is a pipe here, so every
//! deployment command falls back to headless output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Binary with an isolated config file and no inherited overrides
fn deploy_view_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("deploy-view").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("config.toml"))
        .env_remove("DEPLOY_VIEW_LOG")
        .env_remove("DEPLOY_VIEW_HEADLESS")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

const EVENTS: &str = r#"{"type":"instance","instance_id":"i-1","status":"deploying","update_timestamp":100}
{"type":"resource","instance_id":"i-1","resource_name":"ordersTable","status":"creating","update_timestamp":101}
{"type":"resource","instance_id":"i-1","resource_name":"ordersTable","status":"created","durations":{"total_ms":2500},"update_timestamp":103}
{"type":"finished","instance_id":"i-1","status":"deployed","finish_timestamp":104}
"#;

const CHANGESET: &str = r#"{
  "new_resources": {
    "ordersTable": { "resource_type": "aws/dynamodb/table" },
    "ordersQueue": { "resource_type": "aws/sqs/queue" }
  }
}"#;

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    deploy_view_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Watch blueprint deployments"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("demo"));
}

#[test]
fn test_watch_help() {
    let dir = TempDir::new().unwrap();
    deploy_view_cmd(&dir)
        .args(["watch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--events"))
        .stdout(predicate::str::contains("--changeset"))
        .stdout(predicate::str::contains("--headless"));
}

// ============================================================================
// Demo deployments
// ============================================================================

#[test]
fn test_demo_headless_succeeds() {
    let dir = TempDir::new().unwrap();
    deploy_view_cmd(&dir)
        .args(["demo", "--headless", "--pace-ms", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("resource ordersTable created"))
        .stdout(predicate::str::contains("child    networking"))
        .stdout(predicate::str::contains("Deployment orders-api deployed"))
        .stdout(predicate::str::contains("Exports:"))
        .stdout(predicate::str::contains("apiUrl"));
}

#[test]
fn test_failing_demo_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    deploy_view_cmd(&dir)
        .args(["demo", "--fail", "--headless", "--pace-ms", "0"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Failures:"))
        .stdout(predicate::str::contains("AccessDenied"));
}

// ============================================================================
// Replayed event streams
// ============================================================================

#[test]
fn test_watch_replays_events_with_changeset() {
    let dir = TempDir::new().unwrap();
    let events = dir.path().join("events.ndjson");
    let changeset = dir.path().join("changes.json");
    fs::write(&events, EVENTS).unwrap();
    fs::write(&changeset, CHANGESET).unwrap();

    deploy_view_cmd(&dir)
        .arg("watch")
        .arg("--events")
        .arg(&events)
        .arg("--changeset")
        .arg(&changeset)
        .arg("--headless")
        .assert()
        .success()
        .stdout(predicate::str::contains("resource ordersTable creating"))
        .stdout(predicate::str::contains("resource ordersTable created"))
        .stdout(predicate::str::contains("Deployment i-1 deployed"))
        // never touched by an event
        .stdout(predicate::str::contains("1 skipped"));
}

#[test]
fn test_watch_reads_stdin() {
    let dir = TempDir::new().unwrap();
    deploy_view_cmd(&dir)
        .args(["watch", "--events", "-", "--headless"])
        .write_stdin(EVENTS)
        .assert()
        .success()
        .stdout(predicate::str::contains("Deployment i-1 deployed"));
}

#[test]
fn test_watch_shows_instance_exports() {
    let dir = TempDir::new().unwrap();
    let events = dir.path().join("events.ndjson");
    let state = dir.path().join("state.json");
    fs::write(&events, EVENTS).unwrap();
    fs::write(
        &state,
        r#"{"instance_id":"i-1","instance_name":"orders","exports":{"tableArn":"arn:aws:dynamodb:orders"}}"#,
    )
    .unwrap();

    deploy_view_cmd(&dir)
        .arg("watch")
        .arg("--events")
        .arg(&events)
        .arg("--instance-state")
        .arg(&state)
        .arg("--headless")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deployment orders deployed"))
        .stdout(predicate::str::contains("arn:aws:dynamodb:orders"));
}

#[test]
fn test_malformed_event_reports_line() {
    let dir = TempDir::new().unwrap();
    let events = dir.path().join("events.ndjson");
    fs::write(
        &events,
        "{\"type\":\"instance\",\"instance_id\":\"i-1\",\"status\":\"deploying\"}\nnot json\n",
    )
    .unwrap();

    deploy_view_cmd(&dir)
        .arg("watch")
        .arg("--events")
        .arg(&events)
        .arg("--headless")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DV-010"))
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_stream_ending_early_is_an_error() {
    let dir = TempDir::new().unwrap();
    let events = dir.path().join("events.ndjson");
    fs::write(
        &events,
        "{\"type\":\"instance\",\"instance_id\":\"i-1\",\"status\":\"deploying\"}\n",
    )
    .unwrap();

    deploy_view_cmd(&dir)
        .arg("watch")
        .arg("--events")
        .arg(&events)
        .arg("--headless")
        .assert()
        .failure()
        .stdout(predicate::str::contains("did not finish"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_missing_events_file() {
    let dir = TempDir::new().unwrap();
    deploy_view_cmd(&dir)
        .args(["watch", "--events", "/nonexistent/events.ndjson", "--headless"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DV-001"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    deploy_view_cmd(&dir)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(dir.path().join("config.toml").exists());

    deploy_view_cmd(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    deploy_view_cmd(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tick_rate_ms = 250"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("config.toml"), "[ui]\nlist_width_pct = 95\n").unwrap();

    deploy_view_cmd(&dir)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("list_width_pct"));
}
