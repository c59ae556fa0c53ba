// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level scenarios: the cross-crate laws of the fabric,
//! exercised end to end against real stores, state files, and child
//! processes.

use hfo_core::{Component, DaemonSpec, Envelope, ModelNeed, Paths, Port};
use hfo_daemons::meadows::{Rule, RuleAction, RuleCondition, RulesEngine};
use hfo_daemons::{MeadowsDaemon, NoopHooks};
use hfo_store::{Publisher, Ssot};
use hfo_supervisor::{pid_alive, Gate, GateOptions, Registry, SpellState};
use hfo_wish::{Compiler, PipelineStatus};
use hfo_worker::{Worker, WorkerContext};
use serde_json::json;
use serial_test::serial;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

fn sleeper_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(DaemonSpec {
        key: "watcher".into(),
        display_name: "Lidless Watcher".into(),
        port: Port::P0,
        commander: "Lidless Legion".into(),
        program: "/bin/sleep".into(),
        default_args: vec!["300".into()],
        model_need: ModelNeed::None,
        required_model: None,
        min_memory_gb: 0.0,
        cycle_interval_s: 120.0,
        priority: 3,
        spell_cast: "TREMORSENSE".into(),
        is_persistent: true,
    });
    registry
}

fn fast_gate(dir: &TempDir, registry: Registry) -> Gate {
    let paths = Paths::new(dir.path());
    let ssot = Ssot::open(paths.ssot_db()).unwrap();
    Gate::with_options(
        paths,
        registry,
        ssot,
        GateOptions {
            settle: Duration::from_millis(150),
            grace: Duration::from_secs(1),
        },
    )
    .unwrap()
}

// Scenario: cold start to first event. An empty store, one summon, and
// the trail holds exactly a summon and an incarnate while the state
// file records a live pid.
#[tokio::test]
#[serial]
async fn scenario_cold_start_to_first_event() {
    let dir = tempdir().unwrap();
    let mut gate = fast_gate(&dir, sleeper_registry());
    assert_eq!(gate.ssot().event_count().unwrap(), 0);

    let receipt = gate.summon("watcher", &[], false, false).await.unwrap();
    let pid = receipt.pid.unwrap();

    assert_eq!(gate.ssot().event_count().unwrap(), 2);
    assert!(gate.ssot().read_last_matching("%spell_gate.summon").unwrap().is_some());
    assert!(gate.ssot().read_last_matching("%spell_gate.incarnate").unwrap().is_some());

    let state = SpellState::load(&Paths::new(dir.path()).spell_state());
    assert_eq!(state.daemons.len(), 1);
    assert!(pid_alive(state.daemons["watcher"].pid));
    assert_eq!(state.daemons["watcher"].pid, pid);

    gate.banish("watcher", false).unwrap();
}

// Scenario: dedup on duplicate publish. Appending the same envelope
// twice leaves exactly one row; the second append returns 0.
#[test]
#[serial]
fn scenario_dedup_on_duplicate_publish() {
    let ssot = Ssot::open_in_memory().unwrap();
    let envelope = Envelope::new(
        "hfo.gen90.p0.watcher.sense",
        "hfo_p0_watcher_gen90",
        "SENSE:HEALTHY",
        json!({"cpu": 3.5}),
    );
    let hash = envelope.content_hash().unwrap();
    let data_json = envelope.canonical_json().unwrap();

    let before = ssot.event_count().unwrap();
    let first = ssot
        .append(&envelope.event_type, &envelope.time, &envelope.subject, &envelope.source, &data_json, &hash)
        .unwrap();
    let second = ssot
        .append(&envelope.event_type, &envelope.time, &envelope.subject, &envelope.source, &data_json, &hash)
        .unwrap();

    assert!(first > 0);
    assert_eq!(second, 0);
    assert_eq!(ssot.event_count().unwrap(), before + 1);
}

// Scenario: preflight fails on a missing runnable. No process spawns,
// one error event lands, and the failed check is named.
#[tokio::test]
#[serial]
async fn scenario_preflight_fails_on_missing_runnable() {
    let dir = tempdir().unwrap();
    let mut registry = Registry::new();
    registry.register(DaemonSpec {
        key: "ghost".into(),
        display_name: "Ghost".into(),
        port: Port::P0,
        commander: "Nobody".into(),
        program: "/definitely/not/a/binary".into(),
        default_args: vec![],
        model_need: ModelNeed::None,
        required_model: None,
        min_memory_gb: 0.0,
        cycle_interval_s: 1.0,
        priority: 1,
        spell_cast: "NONE".into(),
        is_persistent: false,
    });
    let mut gate = fast_gate(&dir, registry);

    let receipt = gate.summon("ghost", &[], false, false).await.unwrap();

    assert_eq!(receipt.status, hfo_supervisor::SummonStatus::PreflightFailed);
    assert!(receipt.pid.is_none());
    let preflight = receipt.preflight.unwrap();
    assert!(preflight.failed_checks().iter().any(|c| c.name == "script_exists"));
    assert_eq!(gate.ssot().event_count().unwrap(), 1);
}

// Scenario: the compiler rejects an empty intent before pass 2 exists.
#[tokio::test]
#[serial]
async fn scenario_compiler_rejects_empty_intent() {
    let dir = tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let ssot = Ssot::open(paths.ssot_db()).unwrap();
    let mut compiler = Compiler::new(&paths, ssot, true).unwrap();

    let pipeline = compiler.compile("", vec![]).await.unwrap();

    assert_eq!(pipeline.status, PipelineStatus::Rejected);
    assert!(pipeline.pass_results.len() <= 1);
    assert!(compiler.ssot().read_last_matching("%pass2.cards").unwrap().is_none());
}

// Scenario: one governance-file byte flips and the next check reports
// drift in the file_hashes dimension, naming the file.
#[tokio::test]
#[serial]
async fn scenario_drift_after_governance_file_edit() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("AGENTS.md"), "rules v1\n").unwrap();
    let paths = Paths::new(dir.path());
    let ssot = Ssot::open(paths.ssot_db()).unwrap();
    let anchor = hfo_anchor::Anchor::new(paths, ssot).unwrap();

    anchor.anchor().await.unwrap();
    std::fs::write(dir.path().join("AGENTS.md"), "rules v2\n").unwrap();

    match anchor.check().await.unwrap() {
        hfo_anchor::CheckOutcome::DriftDetected { dimensions, .. } => {
            let files = dimensions.get("file_hashes").expect("file_hashes dimension");
            assert!(files.iter().any(|d| d.starts_with("AGENTS.md:")));
        }
        other => panic!("expected drift, got {other:?}"),
    }
}

// Scenario: a violated BLOCK rule self-throttles the governance worker;
// the next tick skips evaluation and publishes exactly one throttle
// event.
#[tokio::test]
#[serial]
async fn scenario_governance_block_self_throttles() {
    let dir = tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let ssot = Ssot::open(paths.ssot_db()).unwrap();
    Publisher::with_source("hfo_noisy_gen90", "90")
        .publish_raw(&ssot, "hfo.gen90.x.tick", "noise", json!({}))
        .unwrap();

    let clock = hfo_core::FakeClock::new();
    let rules = RulesEngine::with_rules(
        clock.clone(),
        vec![Rule::new(
            "T-B01",
            "test_block",
            "blocks on any noisy event",
            RuleCondition::SourceEventCount {
                source_pattern: "%noisy%".into(),
                window_minutes: 60,
            },
            0,
            RuleAction::Block,
            Duration::from_secs(300),
        )],
    );
    let mut daemon =
        MeadowsDaemon::with_clock(clock, Box::new(NoopHooks)).with_rules(rules);
    let publisher = Publisher::for_component(Component::Meadows, "90");
    let mut cx = WorkerContext::new(Paths::new(dir.path()), ssot, publisher, false).unwrap();

    // Tick 1: violation. Tick 2: skipped with a single throttle event.
    daemon.run_cycle(&mut cx).await.unwrap();
    let report = daemon.run_cycle(&mut cx).await.unwrap();
    assert_eq!(report.tallies.get("throttled_skips"), Some(&1));

    let throttles = cx.ssot.query_by_pattern("%l5.cooldown_active", 60, 10).unwrap();
    assert_eq!(throttles.len(), 1);
}

// Law: append ids are monotonic per writer, and every stored envelope
// is complete.
#[test]
#[serial]
fn law_monotonic_ids_and_envelope_completeness() {
    let ssot = Ssot::open_in_memory().unwrap();
    let publisher = Publisher::for_component(Component::Watcher, "90");
    const EVT: hfo_core::EventType = hfo_core::EventType::new(Component::Watcher, "sense");

    let mut last = 0;
    for n in 0..5 {
        let id = publisher
            .publish(&ssot, &EVT, &format!("SENSE:{n}"), json!({"n": n}))
            .unwrap();
        assert!(id > last);
        last = id;
    }

    for event in ssot.read_by_id_range(0, 100).unwrap() {
        for key in ["specversion", "type", "source", "subject", "time", "data"] {
            assert!(event.data.get(key).is_some(), "missing {key}");
        }
    }
}
