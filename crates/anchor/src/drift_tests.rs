// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::baseline::tests::fixed_baseline;
use hfo_probe::{GpuVerdict, RamVerdict};

#[test]
fn test_identical_captures_have_no_drift() {
    let baseline = fixed_baseline();
    assert!(detect_drift(&baseline, &baseline.clone()).is_empty());
}

#[test]
fn test_file_hash_change_names_the_file() {
    let baseline = fixed_baseline();
    let mut current = baseline.clone();
    current
        .file_hashes
        .insert("AGENTS.md".to_string(), "ffff999".to_string());

    let drift = detect_drift(&baseline, &current);
    let deltas = drift.get("file_hashes").unwrap();
    assert_eq!(deltas.len(), 1);
    assert!(deltas[0].starts_with("AGENTS.md:"));
}

#[test]
fn test_verdict_change_is_always_drift() {
    let baseline = fixed_baseline();
    let mut current = baseline.clone();
    current.ram_verdict = RamVerdict::Warning;
    current.gpu_verdict = GpuVerdict::Warning;

    let drift = detect_drift(&baseline, &current);
    assert!(drift.contains_key("memory"));
    assert!(drift.contains_key("gpu"));
}

#[test]
fn test_quantitative_drift_respects_thresholds() {
    let baseline = fixed_baseline();

    // Below threshold: no drift.
    let mut mild = baseline.clone();
    mild.ram_percent = baseline.ram_percent + 9.0;
    mild.vram_used_gb = baseline.vram_used_gb + 0.9;
    assert!(detect_drift(&baseline, &mild).is_empty());

    // Past threshold: drift.
    let mut heavy = baseline.clone();
    heavy.ram_percent = baseline.ram_percent + 10.5;
    heavy.vram_used_gb = baseline.vram_used_gb + 1.5;
    let drift = detect_drift(&baseline, &heavy);
    assert!(drift.contains_key("memory"));
    assert!(drift.contains_key("gpu"));
}

#[test]
fn test_fleet_changes() {
    let baseline = fixed_baseline();
    let mut current = baseline.clone();
    current.fleet.remove("watcher");
    current.fleet.insert("singer".to_string(), 999);

    let deltas = detect_drift(&baseline, &current);
    let fleet = deltas.get("daemon_fleet").unwrap();
    assert!(fleet.iter().any(|d| d.contains("watcher") && d.contains("gone")));
    assert!(fleet.iter().any(|d| d.contains("singer") && d.contains("appeared")));
}

#[test]
fn test_event_count_growth_is_not_drift() {
    let baseline = fixed_baseline();
    let mut current = baseline.clone();
    current.event_count += 10_000;
    assert!(detect_drift(&baseline, &current).is_empty());
}

#[test]
fn test_model_set_difference() {
    let baseline = fixed_baseline();
    let mut current = baseline.clone();
    current.loaded_models = vec!["gemma3:12b".into()];

    let drift = detect_drift(&baseline, &current);
    let models = drift.get("loaded_models").unwrap();
    assert!(models.iter().any(|d| d.contains("phi4:14b") && d.contains("unloaded")));
    assert!(models.iter().any(|d| d.contains("gemma3:12b") && d.contains("loaded")));
}
