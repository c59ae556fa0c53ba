// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box checks of the CLI surface and its exit codes.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use serial_test::serial;
use tempfile::tempdir;

fn hfo(root: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("hfo").expect("binary builds");
    cmd.env("HFO_ROOT", root);
    cmd.env_remove("HFO_SSOT_DB");
    cmd
}

#[test]
#[serial]
fn test_no_args_is_usage_error() {
    let dir = tempdir().unwrap();
    hfo(dir.path()).assert().failure().code(2);
}

#[test]
#[serial]
fn test_list_dumps_registry() {
    let dir = tempdir().unwrap();
    hfo(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicates::str::contains("watcher"))
        .stdout(predicates::str::contains("singer"));
}

#[test]
#[serial]
fn test_summon_unknown_daemon_is_domain_failure() {
    let dir = tempdir().unwrap();
    hfo(dir.path())
        .args(["summon", "no_such_daemon"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicates::str::contains("unknown daemon key"));
}

#[test]
#[serial]
fn test_wish_compile_empty_intent_rejected() {
    let dir = tempdir().unwrap();
    hfo(dir.path())
        .args(["wish", "compile", "", "--dry-run"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicates::str::contains("REJECTED"));
}

#[test]
#[serial]
fn test_wish_dry_run_compile_grants() {
    let dir = tempdir().unwrap();
    hfo(dir.path())
        .args(["wish", "compile", "keep the watcher alive", "--dry-run"])
        .assert()
        .success()
        .stdout(predicates::str::contains("GRANTED"));
}

#[test]
#[serial]
fn test_anchor_status_json_is_machine_readable() {
    let dir = tempdir().unwrap();
    let output = hfo(dir.path())
        .args(["anchor", "status", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["status"], "INACTIVE");
}

#[test]
#[serial]
fn test_governance_validate_runs_criteria() {
    let dir = tempdir().unwrap();
    hfo(dir.path())
        .args(["governance", "--validate"])
        .assert()
        .success()
        .stdout(predicates::str::contains("SBE-01"));
}
