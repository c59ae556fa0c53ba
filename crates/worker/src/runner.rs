// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The loop runner: serial cycles, heartbeats, backoff, shutdown.

use crate::context::WorkerContext;
use crate::report::{CycleReport, WorkerError};
use async_trait::async_trait;
use hfo_core::{Component, EventType};
use hfo_probe::{sense_pressure, Pressure};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Backoff ceiling as a multiple of the base interval.
const BACKOFF_CEILING_FACTOR: u32 = 8;

/// A daemon body. The runner owns the loop; implementations own one
/// cycle of domain work.
#[async_trait]
pub trait Worker {
    /// Registry key (subject lines, log fields).
    fn key(&self) -> &str;

    /// Component owning this worker's event types.
    fn component(&self) -> Component;

    /// One cycle. Must be safe to discard on failure: no partial state
    /// survives outside the store.
    async fn run_cycle(&mut self, cx: &mut WorkerContext) -> Result<CycleReport, WorkerError>;
}

/// Loop options from the CLI surface.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub interval: Duration,
    /// Run exactly one cycle and exit.
    pub single: bool,
    pub max_cycles: Option<u64>,
    /// Skip cycles while pressure is CRITICAL.
    pub gate_on_pressure: bool,
}

impl RunOptions {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            single: false,
            max_cycles: None,
            gate_on_pressure: true,
        }
    }

    pub fn single(mut self, single: bool) -> Self {
        self.single = single;
        self
    }

    pub fn max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn gate_on_pressure(mut self, gate: bool) -> Self {
        self.gate_on_pressure = gate;
        self
    }
}

/// Final accounting returned to the CLI.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub cycles: u64,
    pub errors: u64,
    pub tallies: BTreeMap<String, i64>,
}

/// Drive a worker until cancellation or its cycle budget is spent.
pub async fn run_loop<W: Worker + Send>(
    worker: &mut W,
    cx: &mut WorkerContext,
    options: RunOptions,
) -> Result<RunSummary, WorkerError> {
    let component = worker.component();
    let evt_start = EventType::new(component, "start");
    let evt_stop = EventType::new(component, "stop");
    let evt_heartbeat = EventType::new(component, "heartbeat");
    let evt_error = EventType::new(component, "error");
    let key_upper = worker.key().to_uppercase();

    let mut cycles: u64 = 0;
    let mut errors: u64 = 0;
    let mut consecutive_errors: u32 = 0;
    let mut last_error: Option<String> = None;
    let mut tallies: BTreeMap<String, i64> = BTreeMap::new();
    // Loud on the first failure of a backoff window, quiet after.
    let mut failure_logged = false;

    if !cx.dry_run {
        cx.publisher.publish(
            &cx.ssot,
            &evt_start,
            &format!("{key_upper}_START"),
            json!({
                "interval_s": options.interval.as_secs_f64(),
                "single": options.single,
            }),
        )?;
    }
    info!(worker = worker.key(), "loop start");

    loop {
        if cx.cancel.is_cancelled() {
            break;
        }

        let pressure = sense_pressure();
        if options.gate_on_pressure && pressure == Pressure::Critical {
            warn!(worker = worker.key(), "critical pressure, skipping cycle");
            if wait_interval(cx, options.interval).await {
                break;
            }
            continue;
        }

        let started = Instant::now();
        match worker.run_cycle(cx).await {
            Ok(report) => {
                cycles += 1;
                consecutive_errors = 0;
                failure_logged = false;
                for (key, count) in &report.tallies {
                    *tallies.entry(key.clone()).or_insert(0) += count;
                }
                let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
                if !cx.dry_run {
                    cx.publisher.publish(
                        &cx.ssot,
                        &evt_heartbeat,
                        &format!("{key_upper}_HEARTBEAT:{cycles}"),
                        json!({
                            "cycle": cycles,
                            "duration_ms": duration_ms,
                            "tallies": tallies,
                            "pressure": pressure,
                            "port": component.port(),
                            "last_error": last_error,
                            "note": report.note,
                        }),
                    )?;
                }
            }
            Err(err) => {
                errors += 1;
                consecutive_errors = (consecutive_errors + 1).min(BACKOFF_CEILING_FACTOR.ilog2());
                last_error = Some(err.to_string());
                if failure_logged {
                    warn!(worker = worker.key(), "cycle failed again: {err}");
                } else {
                    error!(worker = worker.key(), "cycle failed: {err}");
                    failure_logged = true;
                }
                // Error events must not themselves kill the loop.
                if !cx.dry_run {
                    let _ = cx.publisher.publish_fault(
                        &cx.ssot,
                        &evt_error,
                        &format!("{key_upper}_ERROR:{}", err.kind),
                        err.kind,
                        &err.message,
                        json!({"cycle": cycles + 1, "consecutive_errors": consecutive_errors}),
                    );
                }
            }
        }

        if options.single {
            break;
        }
        if let Some(max) = options.max_cycles {
            if cycles >= max {
                break;
            }
        }

        // Clean cycles sleep the base interval; errors double it up to
        // the ceiling.
        let factor = 1u32 << consecutive_errors;
        let sleep = options.interval * factor;
        if wait_interval(cx, sleep).await {
            break;
        }
    }

    if !cx.dry_run {
        cx.publisher.publish(
            &cx.ssot,
            &evt_stop,
            &format!("{key_upper}_STOP"),
            json!({
                "cycles": cycles,
                "errors": errors,
                "tallies": tallies,
            }),
        )?;
    }
    info!(worker = worker.key(), cycles, errors, "loop stop");

    Ok(RunSummary {
        cycles,
        errors,
        tallies,
    })
}

/// Sleep, racing cancellation. Returns true when cancelled.
async fn wait_interval(cx: &WorkerContext, interval: Duration) -> bool {
    tokio::select! {
        _ = cx.cancel.cancelled() => true,
        _ = tokio::time::sleep(interval) => false,
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
