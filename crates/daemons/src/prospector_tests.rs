// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hfo_store::{Publisher, Ssot};
use serde_json::json;
use tempfile::tempdir;
use yare::parameterized;

fn valid_raw() -> serde_json::Value {
    json!({
        "song_type": "strife",
        "spell_name": "session rot",
        "subtitle": "Context Decay",
        "pattern_description": "Long sessions silently lose their earliest context.",
        "evidence_quote": "the agent forgot the original goal",
        "suggested_genre": "Doom Metal",
        "confidence": 8,
    })
}

#[test]
fn test_validate_normalizes_and_accepts() {
    let mut session = HashSet::new();
    let proposal = validate_proposal(&valid_raw(), 5, &[], &mut session).unwrap();
    assert_eq!(proposal.song_type, "strife");
    assert_eq!(proposal.spell_name, "SESSION_ROT");
    assert_eq!(proposal.confidence, 8);
    assert!(session.contains("strife:SESSION_ROT"));
}

#[parameterized(
    bad_type = { json!({"song_type": "ballad", "spell_name": "X", "confidence": 9}) },
    no_name = { json!({"song_type": "strife", "spell_name": "", "confidence": 9}) },
    missing_name = { json!({"song_type": "strife", "confidence": 9}) },
    low_confidence = { json!({"song_type": "strife", "spell_name": "X", "confidence": 3}) },
)]
fn test_validate_rejects(raw: serde_json::Value) {
    let mut session = HashSet::new();
    assert!(validate_proposal(&raw, 5, &[], &mut session).is_none());
}

#[test]
fn test_validate_rejects_known_names() {
    let mut session = HashSet::new();
    let known = vec!["SESSION_ROT".to_string()];
    assert!(validate_proposal(&valid_raw(), 5, &known, &mut session).is_none());
}

#[test]
fn test_validate_session_dedup() {
    let mut session = HashSet::new();
    assert!(validate_proposal(&valid_raw(), 5, &[], &mut session).is_some());
    assert!(validate_proposal(&valid_raw(), 5, &[], &mut session).is_none());

    // Same name under the other song type is a different tuple.
    let mut other = valid_raw();
    other["song_type"] = json!("splendor");
    assert!(validate_proposal(&other, 5, &[], &mut session).is_some());
}

#[test]
fn test_validate_clamps_and_truncates() {
    let mut raw = valid_raw();
    raw["confidence"] = json!(99);
    raw["subtitle"] = json!("x".repeat(300));
    let mut session = HashSet::new();
    let proposal = validate_proposal(&raw, 5, &[], &mut session).unwrap();
    assert_eq!(proposal.confidence, 10);
    assert_eq!(proposal.subtitle.len(), 100);
}

#[test]
fn test_validate_string_confidence() {
    let mut raw = valid_raw();
    raw["confidence"] = json!("7");
    let mut session = HashSet::new();
    assert_eq!(
        validate_proposal(&raw, 5, &[], &mut session).unwrap().confidence,
        7
    );
}

#[parameterized(
    mid = { 0.7, 0.8 },
    near_top = { 0.9, 1.0 },
    wraps = { 1.0, 0.3 },
)]
fn test_next_temperature(current: f64, expected: f64) {
    assert!((next_temperature(current) - expected).abs() < 1e-9);
}

#[test]
fn test_state_roundtrip() {
    let dir = tempdir().unwrap();
    let paths = Paths::new(dir.path());

    let mut state = ProspectorState::load(&paths);
    assert!((state.temperature - 0.7).abs() < 1e-9);
    state.prospected_ids.insert(7);
    state.prospected_ids.insert(3);
    state.save(&paths).unwrap();

    let loaded = ProspectorState::load(&paths);
    assert_eq!(loaded.prospected_ids.len(), 2);
    assert!(loaded.saved_at.is_some());
}

#[tokio::test]
async fn test_full_pass_resets_and_bumps_temperature() {
    let dir = tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let ssot = Ssot::open_in_memory().unwrap();
    let doc_id = ssot
        .insert_document("only", "body", "", "t", "P6", "note", 500)
        .unwrap();
    let publisher = Publisher::for_component(Component::Prospector, "90");
    let mut cx = WorkerContext::new(paths.clone(), ssot, publisher, false).unwrap();

    // Pretend the whole corpus was already considered.
    let mut state = ProspectorState::load(&paths);
    state.prospected_ids.insert(doc_id);
    state.save(&paths).unwrap();

    let mut prospector = ProspectorDaemon::new();
    let report = prospector.run_cycle(&mut cx).await.unwrap();

    assert_eq!(report.tallies.get("passes_completed"), Some(&1));
    assert!(prospector.state().prospected_ids.is_empty());
    assert!((prospector.state().temperature - 0.8).abs() < 1e-9);

    let event = cx
        .ssot
        .read_last_matching("%song_prospector.pass_complete")
        .unwrap()
        .unwrap();
    assert_eq!(
        event.payload().get("docs_considered").and_then(|v| v.as_i64()),
        Some(1)
    );
}

#[tokio::test]
async fn test_dry_run_marks_docs_without_model_calls() {
    let dir = tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let ssot = Ssot::open_in_memory().unwrap();
    for n in 0..2 {
        ssot.insert_document(&format!("d{n}"), "body text", "", "t", "P6", "note", 500)
            .unwrap();
    }
    let publisher = Publisher::for_component(Component::Prospector, "90");
    let mut cx = WorkerContext::new(paths, ssot, publisher, true).unwrap();

    let mut prospector = ProspectorDaemon::new();
    let report = prospector.run_cycle(&mut cx).await.unwrap();

    assert_eq!(report.tallies.get("docs_prospected"), Some(&2));
    assert_eq!(report.tallies.get("proposals_sung"), Some(&0));
    assert_eq!(cx.ssot.event_count().unwrap(), 0);
    assert_eq!(prospector.state().prospected_ids.len(), 2);
}

#[test]
fn test_prompt_carries_known_names() {
    let prospector = ProspectorDaemon::new();
    let doc = hfo_store::Document {
        id: 1,
        title: "t".into(),
        content: "c".into(),
        bluf: "b".into(),
        source: "s".into(),
        port: "P6".into(),
        doc_type: "note".into(),
        medallion: "bronze".into(),
        word_count: 100,
    };
    let prompt = prospector.compose_prompt(&doc);
    assert!(prompt.contains("POWERWORD_KILL"));
    assert!(prompt.contains("INSPIRE_COURAGE"));
    assert!(prompt.contains("do NOT re-propose"));
}
