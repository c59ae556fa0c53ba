// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

pub(crate) fn fixed_baseline() -> Baseline {
    let mut baseline = Baseline {
        captured_at: "2026-08-01T00:00:00+00:00".into(),
        generation: "90".into(),
        file_hashes: BTreeMap::from([("AGENTS.md".to_string(), "abc123".to_string())]),
        loaded_models: vec!["phi4:14b".into()],
        fleet: BTreeMap::from([("watcher".to_string(), 101u32)]),
        doc_count: 10,
        event_count: 42,
        fts_ok: true,
        env_hash: "envhash".into(),
        ram_percent: 40.0,
        ram_verdict: RamVerdict::Ok,
        vram_used_gb: 2.0,
        gpu_verdict: GpuVerdict::Ok,
        npu_verdict: NpuVerdict::Idle,
        ai_verdict: AiVerdict::Ok,
        cpu_percent: 15.0,
        disk_free_gb: 100.0,
        process_count: 300,
        anchor_hash: String::new(),
    };
    baseline.anchor_hash = compute_anchor_hash(&baseline);
    baseline
}

#[test]
fn test_hash_excludes_itself() {
    let baseline = fixed_baseline();
    let mut copy = baseline.clone();
    copy.anchor_hash = "0000".into();
    // Changing only the hash field does not change the computed hash.
    assert_eq!(compute_anchor_hash(&baseline), compute_anchor_hash(&copy));
}

#[test]
fn test_hash_sensitive_to_content() {
    let baseline = fixed_baseline();
    let mut edited = baseline.clone();
    edited
        .file_hashes
        .insert("AGENTS.md".to_string(), "abc124".to_string());
    assert_ne!(compute_anchor_hash(&baseline), compute_anchor_hash(&edited));
}

#[test]
fn test_hash_survives_serde_roundtrip() {
    // Canonical-on-read: whitespace in the file form must not matter.
    let baseline = fixed_baseline();
    let pretty = serde_json::to_string_pretty(&baseline).unwrap();
    let back: Baseline = serde_json::from_str(&pretty).unwrap();
    assert_eq!(compute_anchor_hash(&baseline), compute_anchor_hash(&back));
    assert_eq!(back.anchor_hash, compute_anchor_hash(&back));
}
