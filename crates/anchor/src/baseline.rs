// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Baseline capture and the integrity hash.

use chrono::{SecondsFormat, Utc};
use hfo_core::envelope::{canonical_json_of, sha256_hex};
use hfo_core::Paths;
use hfo_probe::{probe, AiVerdict, GpuVerdict, NpuVerdict, ProbeDeps, RamVerdict};
use hfo_supervisor::{pid_alive, SpellState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the anchor pins. Flat scalars so the whole struct
/// round-trips through serde for the integrity hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub captured_at: String,
    pub generation: String,
    /// Governance file name -> content hash.
    pub file_hashes: BTreeMap<String, String>,
    pub loaded_models: Vec<String>,
    /// Daemon key -> live pid at capture time.
    pub fleet: BTreeMap<String, u32>,
    pub doc_count: i64,
    pub event_count: i64,
    pub fts_ok: bool,
    /// Hash over the configuration environment.
    pub env_hash: String,
    pub ram_percent: f64,
    pub ram_verdict: RamVerdict,
    pub vram_used_gb: f64,
    pub gpu_verdict: GpuVerdict,
    pub npu_verdict: NpuVerdict,
    pub ai_verdict: AiVerdict,
    pub cpu_percent: f64,
    pub disk_free_gb: f64,
    pub process_count: usize,
    /// Integrity hash over this struct with the field itself excluded.
    pub anchor_hash: String,
}

/// Hash over the canonical serialization with `anchor_hash` excluded.
///
/// Recomputed from the deserialized struct, never from raw file text, so
/// whitespace normalization by an editor cannot fake a tamper.
pub fn compute_anchor_hash(baseline: &Baseline) -> String {
    let mut value = match serde_json::to_value(baseline) {
        Ok(v) => v,
        Err(_) => return String::new(),
    };
    if let Some(map) = value.as_object_mut() {
        map.remove("anchor_hash");
    }
    let canon = serde_json::to_string(&value).unwrap_or_default();
    sha256_hex(canon.as_bytes())
}

/// Capture the current state of every anchored dimension.
pub async fn capture_baseline(paths: &Paths, deps: &ProbeDeps<'_>) -> Baseline {
    let report = probe(deps).await;

    let mut file_hashes = BTreeMap::new();
    for path in paths.governance_files() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        match std::fs::read(&path) {
            Ok(bytes) => {
                file_hashes.insert(name, sha256_hex(&bytes));
            }
            Err(_) => {
                file_hashes.insert(name, "ABSENT".to_string());
            }
        }
    }

    let spell_state = SpellState::load(&paths.spell_state());
    let fleet: BTreeMap<String, u32> = spell_state
        .daemons
        .iter()
        .filter(|(_, r)| pid_alive(r.pid))
        .map(|(k, r)| (k.clone(), r.pid))
        .collect();

    let mut baseline = Baseline {
        captured_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
        generation: hfo_core::env::generation(),
        file_hashes,
        loaded_models: report.gpu.loaded_models.iter().map(|m| m.name.clone()).collect(),
        fleet,
        doc_count: report.ssot.doc_count,
        event_count: report.ssot.event_count,
        fts_ok: report.ssot.fts_ok,
        env_hash: env_hash(),
        ram_percent: report.ram.percent,
        ram_verdict: report.ram.verdict,
        vram_used_gb: report.gpu.vram_used_gb,
        gpu_verdict: report.gpu.verdict,
        npu_verdict: report.npu.verdict,
        ai_verdict: report.ai.verdict,
        cpu_percent: report.system.cpu_percent,
        disk_free_gb: report.system.disk_free_gb,
        process_count: report.system.process_count,
        anchor_hash: String::new(),
    };
    baseline.anchor_hash = compute_anchor_hash(&baseline);
    baseline
}

/// Hash over the configuration environment the fabric honors.
fn env_hash() -> String {
    let vars = [
        "HFO_GENERATION",
        "HFO_DAEMONS_ENABLED",
        "OLLAMA_HOST",
        "HFO_SECONDARY_BASE_URL",
        "HFO_EMBED_MODEL",
        "HFO_GENERATE_MODEL",
        "HFO_VRAM_BUDGET_GB",
    ];
    let snapshot: BTreeMap<&str, String> = vars
        .iter()
        .map(|v| (*v, std::env::var(v).unwrap_or_default()))
        .collect();
    let canon = canonical_json_of(&snapshot).unwrap_or_default();
    sha256_hex(canon.as_bytes())
}

#[cfg(test)]
#[path = "baseline_tests.rs"]
pub(crate) mod tests;
