// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sensing arm: re-embed what the shaping arm touched, then scan
//! the embedding space for clusters and orphans.

use hfo_core::{Component, EventType};
use hfo_store::cosine_similarity;
use hfo_worker::{WorkerContext, WorkerError};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

const EVT_DISCOVERY: EventType = EventType::new(Component::Kraken, "npu.discovery");
const EVT_ENRICHMENT_TYPE: EventType = EventType::new(Component::Kraken, "gpu.enrichment");

const CLUSTER_THRESHOLD: f32 = 0.82;
const ORPHAN_THRESHOLD: f32 = 0.30;
const EMBEDDING_SCAN_CAP: i64 = 200;

/// What one reach of the sensing arm found.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub embedded: Vec<i64>,
    pub clusters: Vec<Vec<i64>>,
    pub outliers: Vec<i64>,
}

/// Greedy transitive grouping over pairwise cosine similarity.
///
/// Documents joined by any similarity above `cluster_threshold` share a
/// cluster; documents whose best similarity stays under
/// `orphan_threshold` are outliers. Singleton groups are not clusters.
pub fn cluster_scan(
    embeddings: &[(i64, Vec<f32>)],
    cluster_threshold: f32,
    orphan_threshold: f32,
) -> (Vec<Vec<i64>>, Vec<i64>) {
    let n = embeddings.len();
    let mut best_sim = vec![f32::MIN; n];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in (i + 1)..n {
            let sim = cosine_similarity(&embeddings[i].1, &embeddings[j].1);
            best_sim[i] = best_sim[i].max(sim);
            best_sim[j] = best_sim[j].max(sim);
            if sim > cluster_threshold {
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
    }

    let mut visited = vec![false; n];
    let mut clusters = Vec::new();
    for start in 0..n {
        if visited[start] || adjacency[start].is_empty() {
            continue;
        }
        let mut group = Vec::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            group.push(embeddings[node].0);
            for &next in &adjacency[node] {
                if !visited[next] {
                    stack.push(next);
                }
            }
        }
        group.sort_unstable();
        clusters.push(group);
    }

    let outliers = (0..n)
        .filter(|&i| n > 1 && best_sim[i] < orphan_threshold)
        .map(|i| embeddings[i].0)
        .collect();

    (clusters, outliers)
}

/// The cheap sensing arm.
pub struct CheapArm {
    embed_model: String,
    total_embedded: i64,
    total_clusters: i64,
    total_outliers: i64,
}

impl CheapArm {
    pub fn new() -> Self {
        Self {
            embed_model: hfo_core::env::embed_model(),
            total_embedded: 0,
            total_clusters: 0,
            total_outliers: 0,
        }
    }

    pub fn stats(&self) -> BTreeMap<&'static str, i64> {
        BTreeMap::from([
            ("total_embedded", self.total_embedded),
            ("total_clusters", self.total_clusters),
            ("total_outliers", self.total_outliers),
        ])
    }

    /// One reach: embed, scan, publish a discovery event.
    pub async fn reach(
        &mut self,
        cx: &mut WorkerContext,
        batch: i64,
    ) -> Result<Discovery, WorkerError> {
        if batch == 0 {
            return Ok(Discovery::default());
        }

        // Docs the expensive arm touched, read only off the trail.
        let mut targets: Vec<i64> = Vec::new();
        let mut seen = BTreeSet::new();
        let enrichments = cx.ssot.query_by_pattern(
            &EVT_ENRICHMENT_TYPE.render(&cx.generation),
            24 * 60,
            5,
        )?;
        for event in &enrichments {
            if let Some(ids) = event.payload().get("enriched").and_then(|v| v.as_array()) {
                for id in ids.iter().filter_map(|v| v.as_i64()) {
                    if seen.insert(id) {
                        targets.push(id);
                    }
                }
            }
        }
        // Then anything never embedded.
        for id in cx.ssot.docs_without_embedding(batch)? {
            if seen.insert(id) {
                targets.push(id);
            }
        }
        targets.truncate(batch as usize);

        let mut embedded = Vec::new();
        if !cx.dry_run {
            for id in &targets {
                let Some(doc) = cx.ssot.get_document(*id)? else {
                    continue;
                };
                let text = format!("{}\n{}", doc.title, doc.content);
                let vector = cx.primary.embed(&self.embed_model, &text).await?;
                if vector.is_empty() {
                    continue;
                }
                cx.ssot.upsert_embedding(*id, &self.embed_model, &vector)?;
                embedded.push(*id);
            }
        }

        let all = cx.ssot.all_embeddings(EMBEDDING_SCAN_CAP)?;
        let (clusters, outliers) = cluster_scan(&all, CLUSTER_THRESHOLD, ORPHAN_THRESHOLD);

        self.total_embedded += embedded.len() as i64;
        self.total_clusters += clusters.len() as i64;
        self.total_outliers += outliers.len() as i64;

        if !cx.dry_run {
            cx.publisher.publish(
                &cx.ssot,
                &EVT_DISCOVERY,
                &format!("DISCOVERY:{}_embedded", embedded.len()),
                json!({
                    "embedded": embedded,
                    "clusters": clusters,
                    "outliers": outliers,
                    "model": self.embed_model,
                }),
            )?;
        }

        Ok(Discovery {
            embedded,
            clusters,
            outliers,
        })
    }
}

impl Default for CheapArm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "cheap_tests.rs"]
mod tests;
