// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS process control: liveness, detached spawn, terminate.

use crate::error::GateError;
use chrono::{SecondsFormat, Utc};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::warn;

/// Whether a PID is still running.
#[cfg(unix)]
pub fn pid_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(raw), None).is_ok()
}

#[cfg(windows)]
pub fn pid_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    Command::new("tasklist")
        .args(["/FI", &format!("PID eq {pid}"), "/NH"])
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()))
        .unwrap_or(false)
}

/// Request graceful termination (SIGTERM on Unix, forced on Windows).
#[cfg(unix)]
pub fn terminate(pid: u32) {
    if let Ok(raw) = i32::try_from(pid) {
        if let Err(e) = nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(raw),
            nix::sys::signal::Signal::SIGTERM,
        ) {
            warn!(pid, "SIGTERM failed: {e}");
        }
    }
}

#[cfg(windows)]
pub fn terminate(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/F", "/PID", &pid.to_string(), "/T"])
        .output();
}

/// Hard kill after the grace window.
#[cfg(unix)]
pub fn kill_hard(pid: u32) {
    if let Ok(raw) = i32::try_from(pid) {
        if let Err(e) = nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(raw),
            nix::sys::signal::Signal::SIGKILL,
        ) {
            warn!(pid, "SIGKILL failed: {e}");
        }
    }
}

#[cfg(windows)]
pub fn kill_hard(pid: u32) {
    terminate(pid);
}

/// Launch a daemon detached, output streams appended to its log file.
///
/// The child outlives this process: it joins a new session/process group
/// and its handle is dropped without waiting.
pub fn spawn_detached(
    program: &Path,
    args: &[String],
    log_file: &Path,
    cwd: &Path,
    banner: &str,
) -> Result<u32, GateError> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| GateError::Spawn(e.to_string()))?;
    }
    let mut log = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| GateError::Spawn(e.to_string()))?;

    let line = "=".repeat(72);
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false);
    let _ = writeln!(log, "\n{line}\n  {banner}\n  Time: {now}\n{line}");

    let stdout = log
        .try_clone()
        .map_err(|e| GateError::Spawn(e.to_string()))?;
    let stderr = log
        .try_clone()
        .map_err(|e| GateError::Spawn(e.to_string()))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let child = cmd.spawn().map_err(|e| GateError::Spawn(e.to_string()))?;
    Ok(child.id())
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
