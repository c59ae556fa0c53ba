// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered preflight validation before a summon.

use crate::process::pid_alive;
use crate::state::SpellState;
use hfo_core::DaemonSpec;
use hfo_model::PrimaryClient;
use serde::Serialize;
use std::path::Path;

/// One named check with human detail.
#[derive(Debug, Clone, Serialize)]
pub struct PreflightCheck {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

/// Full preflight result.
#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub passed: bool,
    pub checks: Vec<PreflightCheck>,
    pub already_running: bool,
    pub running_pid: Option<u32>,
}

impl PreflightReport {
    pub fn failed_checks(&self) -> Vec<&PreflightCheck> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }
}

/// Run every check in order. All must pass for a summon to proceed.
pub async fn preflight_check(
    spec: &DaemonSpec,
    ssot_path: &Path,
    state: &SpellState,
    primary: &PrimaryClient,
) -> PreflightReport {
    let mut checks = Vec::new();

    // 1. Runnable artifact exists
    let exists = spec.program.exists();
    checks.push(PreflightCheck {
        name: "script_exists".into(),
        passed: exists,
        detail: if exists {
            spec.program.display().to_string()
        } else {
            format!("NOT FOUND: {}", spec.program.display())
        },
    });

    // 2. Event store reachable
    let ssot_ok = ssot_path.exists();
    let size_mb = std::fs::metadata(ssot_path)
        .map(|m| m.len() as f64 / 1e6)
        .unwrap_or(0.0);
    checks.push(PreflightCheck {
        name: "ssot_accessible".into(),
        passed: ssot_ok,
        detail: if ssot_ok {
            format!("{} ({size_mb:.1} MB)", ssot_path.display())
        } else {
            format!("NOT FOUND: {}", ssot_path.display())
        },
    });

    // 3. Model provider, when the daemon needs one
    if spec.model_need.needs_any() {
        let alive = primary.is_alive().await;
        checks.push(PreflightCheck {
            name: "model_provider".into(),
            passed: alive,
            detail: if alive {
                format!("{} reachable", primary.base_url())
            } else {
                format!("{} UNREACHABLE", primary.base_url())
            },
        });
        if alive {
            if let Some(model) = &spec.required_model {
                let available = primary.has_model(model).await.unwrap_or(false);
                checks.push(PreflightCheck {
                    name: "model_available".into(),
                    passed: available,
                    detail: if available {
                        format!("{model} installed")
                    } else {
                        format!("{model} NOT FOUND")
                    },
                });
            }
        }
    } else {
        checks.push(PreflightCheck {
            name: "model_provider".into(),
            passed: true,
            detail: "Not required".into(),
        });
    }

    // 4. Feature flags: master + per-daemon toggles
    let master = hfo_core::env::daemons_enabled();
    let daemon_flag = hfo_core::env::daemon_enabled(&spec.key);
    let enabled = master && daemon_flag;
    checks.push(PreflightCheck {
        name: "feature_flag".into(),
        passed: enabled,
        detail: if enabled {
            format!("{}=enabled, master=enabled", hfo_core::env::daemon_flag_name(&spec.key))
        } else {
            format!(
                "DISABLED: {}={daemon_flag}, HFO_DAEMONS_ENABLED={master}",
                hfo_core::env::daemon_flag_name(&spec.key)
            )
        },
    });

    // 5. Not already running under this key
    let running_pid = state.daemons.get(&spec.key).map(|r| r.pid);
    let already_running = running_pid.map(pid_alive).unwrap_or(false);
    checks.push(PreflightCheck {
        name: "not_already_running".into(),
        passed: !already_running,
        detail: match running_pid {
            Some(pid) if already_running => format!("PID {pid} still alive"),
            _ => "Clear".into(),
        },
    });

    PreflightReport {
        passed: checks.iter().all(|c| c.passed),
        checks,
        already_running,
        running_pid: running_pid.filter(|_| already_running),
    }
}

#[cfg(test)]
#[path = "preflight_tests.rs"]
mod tests;
