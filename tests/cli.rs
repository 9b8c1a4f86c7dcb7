// ABOUTME: Integration tests for the rollout CLI commands.
// ABOUTME: Drives the binary against a temporary store and checks output and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn rollout_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rollout"));
    cmd.current_dir(dir)
        .env("ROLLOUT_STORE", dir.join("deployments.json"))
        .env_remove("ROLLOUT_AUDIT_LOG")
        .env_remove("RUST_LOG");
    cmd
}

/// Run `create` in quiet mode and return the new id.
fn create(dir: &Path, args: &[&str]) -> String {
    let output = rollout_cmd(dir)
        .arg("--quiet")
        .arg("create")
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success(), "create failed: {output:?}");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[test]
fn help_shows_commands() {
    let dir = tempfile::tempdir().unwrap();
    rollout_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("quick-rollback"))
        .stdout(predicate::str::contains("promote"));
}

#[test]
fn init_creates_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("rollout.yml");

    rollout_cmd(dir.path()).arg("init").assert().success();

    assert!(config_path.exists(), "rollout.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("store:"));
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("rollout.yml"), "store: {}\n").unwrap();

    rollout_cmd(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn full_lifecycle_through_cli() {
    let dir = tempfile::tempdir().unwrap();
    let id = create(dir.path(), &["api", "1.2.0", "--env", "staging"]);

    rollout_cmd(dir.path())
        .args(["start", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("in_progress"));

    rollout_cmd(dir.path())
        .args(["complete", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("success"));

    rollout_cmd(dir.path())
        .args(["promote", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("[production]"));

    rollout_cmd(dir.path())
        .args(["promote", id.as_str()])
        .assert()
        .success()
        .stderr(predicate::str::contains("already in production"));

    rollout_cmd(dir.path())
        .args(["rollback", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("rolled_back"));

    rollout_cmd(dir.path())
        .args(["rollback", id.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("not eligible"));
}

#[test]
fn empty_name_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    rollout_cmd(dir.path())
        .args(["create", "", "1.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("name is required"));
}

#[test]
fn illegal_transition_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let id = create(dir.path(), &["api", "1.2.0"]);

    rollout_cmd(dir.path())
        .args(["complete", id.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot complete"));
}

#[test]
fn failed_completion_records_message() {
    let dir = tempfile::tempdir().unwrap();
    let id = create(dir.path(), &["api", "1.2.0"]);
    rollout_cmd(dir.path()).args(["start", id.as_str()]).assert().success();

    let output = rollout_cmd(dir.path())
        .args(["--json", "complete", id.as_str(), "--failed", "--message", "build failed"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let row: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(row["status"], "failed");
    assert_eq!(row["error_message"], "build failed");
}

#[test]
fn list_filters_and_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    create(dir.path(), &["checkout", "1.0.0", "--env", "staging"]);
    create(dir.path(), &["billing", "2.0.0", "--env", "production"]);

    let output = rollout_cmd(dir.path())
        .args(["--json", "list", "--env", "production"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "billing");

    rollout_cmd(dir.path())
        .args(["list", "--search", "CHECK"])
        .assert()
        .success()
        .stdout(predicate::str::contains("checkout"))
        .stdout(predicate::str::contains("billing").not());
}

#[test]
fn stats_reports_totals() {
    let dir = tempfile::tempdir().unwrap();
    create(dir.path(), &["api", "1.0.0"]);
    create(dir.path(), &["api", "1.1.0"]);

    let output = rollout_cmd(dir.path())
        .args(["--json", "stats"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["pending"], 2);
}

#[test]
fn quick_rollback_without_live_deployment_fails() {
    let dir = tempfile::tempdir().unwrap();
    rollout_cmd(dir.path())
        .args(["quick-rollback", "1.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no successful production deployment"));
}

#[test]
fn unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    rollout_cmd(dir.path())
        .args(["show", "6f1c1f4e-1f0a-4f43-9a55-2f7c4a1b2c3d"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
