// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drift detection across the ten anchored dimensions.
//!
//! Verdict changes always drift; quantitative deltas drift only past
//! their per-dimension thresholds.

use crate::baseline::Baseline;
use std::collections::BTreeMap;

const RAM_PERCENT_THRESHOLD: f64 = 10.0;
const VRAM_GB_THRESHOLD: f64 = 1.0;
const DISK_GB_THRESHOLD: f64 = 5.0;
const PROCESS_COUNT_THRESHOLD: i64 = 200;

/// Dimension name -> human delta lines. Empty map = anchored.
pub type DriftMap = BTreeMap<String, Vec<String>>;

/// Diff two captures. `baseline` is the pinned state, `current` a fresh
/// capture of the same dimensions.
pub fn detect_drift(baseline: &Baseline, current: &Baseline) -> DriftMap {
    let mut drift = DriftMap::new();

    // 1. daemon_fleet
    let mut fleet = Vec::new();
    for (key, pid) in &baseline.fleet {
        match current.fleet.get(key) {
            None => fleet.push(format!("{key}: gone (was pid {pid})")),
            Some(now) if now != pid => fleet.push(format!("{key}: pid {pid} -> {now}")),
            _ => {}
        }
    }
    for key in current.fleet.keys() {
        if !baseline.fleet.contains_key(key) {
            fleet.push(format!("{key}: appeared"));
        }
    }
    push_if(&mut drift, "daemon_fleet", fleet);

    // 2. config
    let mut config = Vec::new();
    if baseline.env_hash != current.env_hash {
        config.push("configuration environment changed".to_string());
    }
    if baseline.generation != current.generation {
        config.push(format!(
            "generation {} -> {}",
            baseline.generation, current.generation
        ));
    }
    push_if(&mut drift, "config", config);

    // 3. ssot_stats (event growth is normal, document changes are not)
    let mut ssot = Vec::new();
    if baseline.doc_count != current.doc_count {
        ssot.push(format!(
            "doc_count {} -> {}",
            baseline.doc_count, current.doc_count
        ));
    }
    if baseline.fts_ok != current.fts_ok {
        ssot.push(format!("fts_ok {} -> {}", baseline.fts_ok, current.fts_ok));
    }
    push_if(&mut drift, "ssot_stats", ssot);

    // 4. file_hashes
    let mut files = Vec::new();
    for (name, hash) in &baseline.file_hashes {
        match current.file_hashes.get(name) {
            None => files.push(format!("{name}: no longer tracked")),
            Some(now) if now != hash => {
                files.push(format!("{name}: {} -> {}", shorten(hash), shorten(now)))
            }
            _ => {}
        }
    }
    for name in current.file_hashes.keys() {
        if !baseline.file_hashes.contains_key(name) {
            files.push(format!("{name}: newly tracked"));
        }
    }
    push_if(&mut drift, "file_hashes", files);

    // 5. loaded_models
    let mut models = Vec::new();
    for model in &baseline.loaded_models {
        if !current.loaded_models.contains(model) {
            models.push(format!("{model}: unloaded"));
        }
    }
    for model in &current.loaded_models {
        if !baseline.loaded_models.contains(model) {
            models.push(format!("{model}: loaded"));
        }
    }
    push_if(&mut drift, "loaded_models", models);

    // 6. memory
    let mut memory = Vec::new();
    if baseline.ram_verdict != current.ram_verdict {
        memory.push(format!(
            "verdict {:?} -> {:?}",
            baseline.ram_verdict, current.ram_verdict
        ));
    }
    let ram_delta = (current.ram_percent - baseline.ram_percent).abs();
    if ram_delta > RAM_PERCENT_THRESHOLD {
        memory.push(format!(
            "percent {} -> {} (delta {ram_delta:.1})",
            baseline.ram_percent, current.ram_percent
        ));
    }
    push_if(&mut drift, "memory", memory);

    // 7. gpu
    let mut gpu = Vec::new();
    if baseline.gpu_verdict != current.gpu_verdict {
        gpu.push(format!(
            "verdict {:?} -> {:?}",
            baseline.gpu_verdict, current.gpu_verdict
        ));
    }
    let vram_delta = (current.vram_used_gb - baseline.vram_used_gb).abs();
    if vram_delta > VRAM_GB_THRESHOLD {
        gpu.push(format!(
            "vram_used_gb {} -> {} (delta {vram_delta:.1})",
            baseline.vram_used_gb, current.vram_used_gb
        ));
    }
    push_if(&mut drift, "gpu", gpu);

    // 8. npu
    let mut npu = Vec::new();
    if baseline.npu_verdict != current.npu_verdict {
        npu.push(format!(
            "verdict {:?} -> {:?}",
            baseline.npu_verdict, current.npu_verdict
        ));
    }
    push_if(&mut drift, "npu", npu);

    // 9. ai
    let mut ai = Vec::new();
    if baseline.ai_verdict != current.ai_verdict {
        ai.push(format!(
            "verdict {:?} -> {:?}",
            baseline.ai_verdict, current.ai_verdict
        ));
    }
    push_if(&mut drift, "ai", ai);

    // 10. system
    let mut system = Vec::new();
    let disk_delta = (current.disk_free_gb - baseline.disk_free_gb).abs();
    if disk_delta > DISK_GB_THRESHOLD {
        system.push(format!(
            "disk_free_gb {} -> {} (delta {disk_delta:.1})",
            baseline.disk_free_gb, current.disk_free_gb
        ));
    }
    let proc_delta = (current.process_count as i64 - baseline.process_count as i64).abs();
    if proc_delta > PROCESS_COUNT_THRESHOLD {
        system.push(format!(
            "process_count {} -> {}",
            baseline.process_count, current.process_count
        ));
    }
    push_if(&mut drift, "system", system);

    drift
}

fn push_if(drift: &mut DriftMap, dimension: &str, deltas: Vec<String>) {
    if !deltas.is_empty() {
        drift.insert(dimension.to_string(), deltas);
    }
}

fn shorten(hash: &str) -> &str {
    &hash[..hash.len().min(12)]
}

#[cfg(test)]
#[path = "drift_tests.rs"]
mod tests;
