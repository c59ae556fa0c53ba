// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shaping arm: read the latest discovery off the trail, summarize
//! the documents it points at, record what was touched.

use hfo_core::{Component, EventType};
use hfo_model::GenerateRequest;
use hfo_store::SignalMeta;
use hfo_worker::{WorkerContext, WorkerError};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

const EVT_ENRICHMENT: EventType = EventType::new(Component::Kraken, "gpu.enrichment");
const EVT_DISCOVERY_TYPE: EventType = EventType::new(Component::Kraken, "npu.discovery");

const SUMMARY_SYSTEM: &str =
    "Summarize the document in two dense sentences. No preamble, no markdown.";

/// What one devour of the shaping arm touched.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub enriched: Vec<i64>,
}

/// The expensive shaping arm.
pub struct ExpensiveArm {
    model: String,
    total_enriched: i64,
}

impl ExpensiveArm {
    pub fn new() -> Self {
        Self {
            model: hfo_core::env::generate_model(),
            total_enriched: 0,
        }
    }

    pub fn stats(&self) -> BTreeMap<&'static str, i64> {
        BTreeMap::from([("total_enriched", self.total_enriched)])
    }

    /// Priority order: cluster members first, outliers second, random
    /// fallback last.
    pub(crate) fn prioritize(
        &self,
        cx: &WorkerContext,
        batch: i64,
    ) -> Result<Vec<i64>, WorkerError> {
        let mut targets = Vec::new();
        let mut seen = std::collections::BTreeSet::new();

        if let Some(discovery) = cx
            .ssot
            .read_last_of_type(&EVT_DISCOVERY_TYPE.render(&cx.generation))?
        {
            let payload = discovery.payload();
            if let Some(clusters) = payload.get("clusters").and_then(|v| v.as_array()) {
                for cluster in clusters {
                    if let Some(ids) = cluster.as_array() {
                        for id in ids.iter().filter_map(|v| v.as_i64()) {
                            if seen.insert(id) {
                                targets.push(id);
                            }
                        }
                    }
                }
            }
            if let Some(outliers) = payload.get("outliers").and_then(|v| v.as_array()) {
                for id in outliers.iter().filter_map(|v| v.as_i64()) {
                    if seen.insert(id) {
                        targets.push(id);
                    }
                }
            }
        }

        if (targets.len() as i64) < batch {
            for id in cx.ssot.random_doc_ids(batch)? {
                if seen.insert(id) {
                    targets.push(id);
                }
            }
        }
        targets.truncate(batch as usize);
        Ok(targets)
    }

    /// One devour: summarize prioritized documents, publish an
    /// enrichment event.
    pub async fn devour(
        &mut self,
        cx: &mut WorkerContext,
        batch: i64,
    ) -> Result<Enrichment, WorkerError> {
        if batch == 0 {
            return Ok(Enrichment::default());
        }

        let targets = self.prioritize(cx, batch)?;
        let mut enriched = Vec::new();
        let mut latency_ms = 0.0;

        if !cx.dry_run {
            for id in &targets {
                let Some(doc) = cx.ssot.get_document(*id)? else {
                    continue;
                };
                let prompt = format!("TITLE: {}\n\n{}", doc.title, doc.content);
                let request = GenerateRequest::new(&self.model, &prompt)
                    .system(SUMMARY_SYSTEM)
                    .num_predict(160)
                    .deadline(Duration::from_secs(90));
                let generated = cx.primary.generate(&request).await?;
                if generated.text.is_empty() {
                    continue;
                }
                latency_ms += generated.latency_ms;
                cx.ssot.update_bluf(*id, &generated.text)?;
                enriched.push(*id);
            }

            let signal = SignalMeta {
                port: "P6".to_string(),
                model: self.model.clone(),
                latency_ms,
                tokens_out: 0,
            };
            cx.publisher.publish_with_signal(
                &cx.ssot,
                &EVT_ENRICHMENT,
                &format!("ENRICHMENT:{}_docs", enriched.len()),
                json!({
                    "enriched": enriched,
                    "prioritized": targets,
                    "model": self.model,
                }),
                &signal,
            )?;
        }

        self.total_enriched += enriched.len() as i64;
        Ok(Enrichment { enriched })
    }
}

impl Default for ExpensiveArm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "expensive_tests.rs"]
mod tests;
