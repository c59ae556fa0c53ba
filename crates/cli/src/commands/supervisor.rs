// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spell gate verbs: summon, banish, scrying, sending, watchdog, list.

use crate::exit_error::ExitError;
use crate::output::{emit, print_json};
use hfo_supervisor::{builtin_registry, Gate, SummonStatus};

fn open_gate() -> Result<Gate, ExitError> {
    let paths = super::fabric_paths();
    let ssot = super::open_ssot(&paths)?;
    Ok(Gate::new(paths, builtin_registry(), ssot)?)
}

pub async fn summon(
    key: &str,
    force: bool,
    dry_run: bool,
    extra_args: Vec<String>,
    json: bool,
) -> Result<(), ExitError> {
    let mut gate = open_gate()?;
    let receipt = gate.summon(key, &extra_args, dry_run, force).await?;

    let line = match receipt.status {
        SummonStatus::Summoned => format!(
            "SUMMONED {} (pid {}) log: {}",
            receipt.daemon,
            receipt.pid.unwrap_or(0),
            receipt.log_file.as_deref().unwrap_or("-"),
        ),
        SummonStatus::SummonedButUncertain => format!(
            "SUMMONED {} (pid {}) but liveness is uncertain; check its log",
            receipt.daemon,
            receipt.pid.unwrap_or(0),
        ),
        SummonStatus::AlreadyRunning => format!(
            "{} already running (pid {}); use --force to banish and re-summon",
            receipt.daemon,
            receipt.pid.unwrap_or(0),
        ),
        SummonStatus::PreflightFailed => {
            let failed: Vec<String> = receipt
                .preflight
                .as_ref()
                .map(|p| {
                    p.failed_checks()
                        .iter()
                        .map(|c| format!("{}: {}", c.name, c.detail))
                        .collect()
                })
                .unwrap_or_default();
            format!("PREFLIGHT_FAILED {} [{}]", receipt.daemon, failed.join("; "))
        }
        SummonStatus::DryRun => format!(
            "DRY_RUN would launch: {}",
            receipt.command.as_deref().unwrap_or("-"),
        ),
    };
    emit(json, &receipt, &line)?;

    if receipt.status == SummonStatus::PreflightFailed {
        return Err(ExitError::silent(1));
    }
    Ok(())
}

pub fn banish(key: &str, dry_run: bool, json: bool) -> Result<(), ExitError> {
    let mut gate = open_gate()?;
    let receipt = gate.banish(key, dry_run)?;
    let line = format!("{:?} {} (pid {})", receipt.status, receipt.key, receipt.pid);
    emit(json, &receipt, &line)?;
    if receipt.status == hfo_supervisor::BanishStatus::BanishFailed {
        return Err(ExitError::silent(1));
    }
    Ok(())
}

pub fn scrying(key: Option<&str>, json: bool) -> Result<(), ExitError> {
    let gate = open_gate()?;
    let view = gate.scrying(key)?;
    if json {
        return print_json(&view);
    }
    for (key, status) in &view.fleet {
        println!(
            "{key:<12} {:<16} pid={:<8} port={} {}",
            status.status,
            status.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
            status.port,
            status.name,
        );
    }
    println!("total={} alive={} dead={}", view.total, view.alive, view.dead);
    Ok(())
}

pub fn sending(json: bool) -> Result<(), ExitError> {
    let gate = open_gate()?;
    let view = gate.sending()?;
    if json {
        return print_json(&view);
    }
    for (key, status) in &view.fleet {
        println!(
            "{key:<12} {:<16} last_heartbeat={}",
            status.status,
            status.last_heartbeat.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

pub async fn watchdog(auto_resurrect: bool, json: bool) -> Result<(), ExitError> {
    let mut gate = open_gate()?;
    let report = gate.watchdog_tick(auto_resurrect).await?;
    if json {
        print_json(&report)?;
    } else {
        for (key, entry) in &report.results {
            let tail = entry
                .resummoned
                .as_deref()
                .map(|r| format!(" resummoned={r}"))
                .unwrap_or_default();
            println!(
                "{key:<12} pid={:<8} alive={}{tail}",
                entry.pid, entry.alive
            );
        }
        println!("deaths={}", report.deaths);
    }
    Ok(())
}

pub fn list(json: bool) -> Result<(), ExitError> {
    let registry = builtin_registry();
    if json {
        let specs: Vec<_> = registry.all().collect();
        return print_json(&specs);
    }
    for spec in registry.all() {
        println!(
            "{:<12} {:<4} prio={} persistent={} {}",
            spec.key, spec.port, spec.priority, spec.is_persistent, spec.display_name,
        );
    }
    Ok(())
}
