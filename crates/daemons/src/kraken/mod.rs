// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The P6 kraken strange loop.
//!
//! Two arms in one worker: a cheap sensing arm (re-embed, cluster scan)
//! and an expensive shaping arm (summarize what the sensing arm found).
//! Each arm consumes only the other's event stream, never its in-process
//! memory; a cold start with an empty trail degenerates to a stale-doc
//! sweep.

mod cheap;
mod expensive;

pub use cheap::{cluster_scan, CheapArm, Discovery};
pub use expensive::{Enrichment, ExpensiveArm};

use async_trait::async_trait;
use hfo_core::{Component, EventType};
use hfo_probe::{sense_pressure, Pressure};
use hfo_worker::{CycleReport, Worker, WorkerContext, WorkerError};
use serde_json::json;
use tracing::debug;

const EVT_PULSE: EventType = EventType::new(Component::Kraken, "loop.pulse");
const EVT_HEALTH: EventType = EventType::new(Component::Kraken, "loop.health");

const HEALTH_EVERY_N: u64 = 10;

/// Batch sizes per pressure level: take what is given.
pub fn batch_sizes(pressure: Pressure) -> (i64, i64) {
    match pressure {
        Pressure::Idle => (50, 5),
        Pressure::Nominal => (30, 3),
        Pressure::Elevated => (20, 2),
        Pressure::Throttled => (10, 0),
        Pressure::Critical => (0, 0),
    }
}

/// The strange-loop daemon.
pub struct KrakenDaemon {
    cheap: CheapArm,
    expensive: ExpensiveArm,
    cycle: u64,
}

impl KrakenDaemon {
    pub fn new() -> Self {
        Self {
            cheap: CheapArm::new(),
            expensive: ExpensiveArm::new(),
            cycle: 0,
        }
    }
}

impl Default for KrakenDaemon {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for KrakenDaemon {
    fn key(&self) -> &str {
        "kraken"
    }

    fn component(&self) -> Component {
        Component::Kraken
    }

    async fn run_cycle(&mut self, cx: &mut WorkerContext) -> Result<CycleReport, WorkerError> {
        self.cycle += 1;
        let pressure = sense_pressure();
        let (cheap_batch, expensive_batch) = batch_sizes(pressure);

        let discovery = self.cheap.reach(cx, cheap_batch).await?;
        let enrichment = self.expensive.devour(cx, expensive_batch).await?;

        if !cx.dry_run {
            cx.publisher.publish(
                &cx.ssot,
                &EVT_PULSE,
                &format!("PULSE:{}", self.cycle),
                json!({
                    "cycle": self.cycle,
                    "pressure": pressure,
                    "cheap_batch": cheap_batch,
                    "expensive_batch": expensive_batch,
                    "embedded": discovery.embedded.len(),
                    "clusters": discovery.clusters.len(),
                    "outliers": discovery.outliers.len(),
                    "enriched": enrichment.enriched.len(),
                }),
            )?;

            if self.cycle % HEALTH_EVERY_N == 0 {
                let stats = cx.ssot.stats()?;
                cx.publisher.publish(
                    &cx.ssot,
                    &EVT_HEALTH,
                    &format!("KRAKEN_HEALTH:cycle_{}", self.cycle),
                    json!({
                        "cycle": self.cycle,
                        "doc_count": stats.doc_count,
                        "embedding_count": cx.ssot.embedding_count()?,
                        "cheap_stats": self.cheap.stats(),
                        "expensive_stats": self.expensive.stats(),
                    }),
                )?;
            }
        }

        debug!(
            cycle = self.cycle,
            ?pressure,
            embedded = discovery.embedded.len(),
            enriched = enrichment.enriched.len(),
            "kraken pulse"
        );
        Ok(CycleReport::default()
            .tally("embedded", discovery.embedded.len() as i64)
            .tally("clusters_found", discovery.clusters.len() as i64)
            .tally("outliers_found", discovery.outliers.len() as i64)
            .tally("enriched", enrichment.enriched.len() as i64))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
