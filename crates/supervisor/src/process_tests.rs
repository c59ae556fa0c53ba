// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_pid_zero_is_never_alive() {
    assert!(!pid_alive(0));
}

#[test]
fn test_own_pid_is_alive() {
    assert!(pid_alive(std::process::id()));
}

#[cfg(unix)]
#[test]
fn test_spawn_terminate_roundtrip() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("logs/sleep.log");

    let pid = spawn_detached(
        &PathBuf::from("/bin/sleep"),
        &["30".to_string()],
        &log,
        dir.path(),
        "SUMMON_FAMILIAR: test sleeper",
    )
    .unwrap();

    assert!(pid_alive(pid));
    assert!(log.exists());
    let banner = std::fs::read_to_string(&log).unwrap();
    assert!(banner.contains("SUMMON_FAMILIAR: test sleeper"));

    terminate(pid);
    // SIGTERM on sleep is prompt; poll briefly.
    for _ in 0..50 {
        if !pid_alive(pid) {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    assert!(!pid_alive(pid));
}

#[cfg(unix)]
#[test]
fn test_spawn_missing_program_errors() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("x.log");
    let result = spawn_detached(
        &PathBuf::from("/definitely/not/a/binary"),
        &[],
        &log,
        dir.path(),
        "banner",
    );
    assert!(matches!(result, Err(GateError::Spawn(_))));
}
