// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The P0 watcher: the compute-cheap sensing loop.
//!
//! Each cycle captures a full resource probe and leaves it on the trail
//! for every other daemon to read.

use async_trait::async_trait;
use hfo_core::{Component, EventType};
use hfo_probe::{probe, ProbeDeps};
use hfo_worker::{CycleReport, Worker, WorkerContext, WorkerError};

const EVT_SENSE: EventType = EventType::new(Component::Watcher, "sense");

#[derive(Debug, Default)]
pub struct WatcherDaemon;

#[async_trait]
impl Worker for WatcherDaemon {
    fn key(&self) -> &str {
        "watcher"
    }

    fn component(&self) -> Component {
        Component::Watcher
    }

    async fn run_cycle(&mut self, cx: &mut WorkerContext) -> Result<CycleReport, WorkerError> {
        let deps = ProbeDeps {
            primary: &cx.primary,
            secondary: cx.secondary.as_ref(),
            ssot: Some(&cx.ssot),
        };
        let report = probe(&deps).await;
        let status = format!("{:?}", report.status).to_uppercase();

        if !cx.dry_run {
            cx.publisher.publish(
                &cx.ssot,
                &EVT_SENSE,
                &format!("SENSE:{status}"),
                serde_json::to_value(&report)
                    .map_err(|e| WorkerError::internal(e.to_string()))?,
            )?;
        }

        Ok(CycleReport::default()
            .tally("probes", 1)
            .note(format!("status={status}")))
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
