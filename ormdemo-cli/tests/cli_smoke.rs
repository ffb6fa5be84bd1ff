//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn ormdemo() -> Command {
    let mut cmd = Command::cargo_bin("ormdemo").unwrap();
    cmd.env_remove("DATABASE_URL").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_top_level_help_lists_commands() {
    ormdemo()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("demo"));
}

#[test]
fn test_serve_help() {
    ormdemo()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--tx-timeout-ms"))
        .stdout(predicate::str::contains("127.0.0.1:4000"));
}

#[test]
fn test_demo_help() {
    ormdemo()
        .args(["demo", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--page-size"));
}

#[test]
fn test_migrate_without_database_url_fails() {
    ormdemo()
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL not set"));
}

#[test]
fn test_unknown_command_fails() {
    ormdemo().arg("seed").assert().failure();
}
