// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::meadows::rules::RulesEngine;
use hfo_core::{Component, FakeClock};
use hfo_store::Publisher;
use std::time::Duration;

fn outcome(id: &str, status: RuleStatus, value: i64) -> RuleOutcome {
    RuleOutcome {
        id: id.to_string(),
        name: id.to_string(),
        status,
        value,
        action: None,
    }
}

fn setup() -> (Ssot, Publisher, FakeClock) {
    let ssot = Ssot::open_in_memory().unwrap();
    let publisher = Publisher::for_component(Component::Meadows, "90");
    (ssot, publisher, FakeClock::new())
}

#[test]
fn test_vram_breach_proposes_rebalance() {
    let (ssot, publisher, clock) = setup();
    let mut engine = StructureEngine::new(clock);

    let l5 = vec![outcome("L5-R02", RuleStatus::Violated, 1)];
    let proposed = engine.evaluate_topology(&ssot, &publisher, &l5, false).unwrap();

    assert_eq!(proposed.len(), 1);
    assert_eq!(proposed[0].action, ProposalAction::Rebalance);
    assert_eq!(proposed[0].target, "gpu_models");

    let event = ssot.read_last_matching("%l4.structure_proposal").unwrap().unwrap();
    assert_eq!(
        event.payload().get("proposal_id").and_then(|v| v.as_str()),
        Some(proposed[0].id.as_str())
    );
}

#[test]
fn test_pending_proposal_not_duplicated() {
    let (ssot, publisher, clock) = setup();
    let mut engine = StructureEngine::new(clock);

    let l5 = vec![outcome("L5-R02", RuleStatus::Violated, 1)];
    engine.evaluate_topology(&ssot, &publisher, &l5, false).unwrap();
    let second = engine.evaluate_topology(&ssot, &publisher, &l5, false).unwrap();

    assert!(second.is_empty());
    assert_eq!(engine.proposals().len(), 1);
}

#[test]
fn test_two_phase_enactment_waits_for_cooldown() {
    let (ssot, publisher, clock) = setup();
    let mut engine = StructureEngine::new(clock.clone());

    let l5 = vec![outcome("L5-R02", RuleStatus::Violated, 1)];
    engine.evaluate_topology(&ssot, &publisher, &l5, false).unwrap();

    // Immature: nothing enacts.
    assert!(engine.enact_mature(&ssot, &publisher, false).unwrap().is_empty());

    // Past cooldown: enacts exactly once.
    clock.advance(Duration::from_secs(601));
    let enacted = engine.enact_mature(&ssot, &publisher, false).unwrap();
    assert_eq!(enacted.len(), 1);
    assert!(engine.enact_mature(&ssot, &publisher, false).unwrap().is_empty());

    // The enact event shares the proposal's id and records a gap >= cooldown.
    let enact_event = ssot.read_last_matching("%l4.structure_enacted").unwrap().unwrap();
    let proposal_event = ssot.read_last_matching("%l4.structure_proposal").unwrap().unwrap();
    assert!(proposal_event.id < enact_event.id);
    assert_eq!(
        enact_event.payload().get("proposal_id"),
        proposal_event.payload().get("proposal_id")
    );
    let proposed = enact_event
        .payload()
        .get("proposed_at_epoch_s")
        .and_then(|v| v.as_u64())
        .unwrap();
    let enacted_at = enact_event
        .payload()
        .get("enacted_at_epoch_s")
        .and_then(|v| v.as_u64())
        .unwrap();
    let cooldown = enact_event
        .payload()
        .get("cooldown_s")
        .and_then(|v| v.as_u64())
        .unwrap();
    assert!(enacted_at - proposed >= cooldown);
}

#[test]
fn test_missing_embeddings_propose_waking_the_kraken() {
    let (ssot, publisher, clock) = setup();
    let mut engine = StructureEngine::new(clock);

    for n in 0..5 {
        ssot.insert_document(&format!("d{n}"), "body", "", "t", "P6", "note", 100)
            .unwrap();
    }

    let proposed = engine.evaluate_topology(&ssot, &publisher, &[], false).unwrap();
    assert_eq!(proposed.len(), 1);
    assert_eq!(proposed[0].action, ProposalAction::EnableDaemon);
    assert_eq!(proposed[0].target, "kraken");
}

#[test]
fn test_rate_pressure_proposes_priority_adjustment() {
    let (ssot, publisher, clock) = setup();
    let mut engine = StructureEngine::new(clock);

    let l5 = vec![outcome("L5-R01", RuleStatus::Ok, 75)];
    let proposed = engine.evaluate_topology(&ssot, &publisher, &l5, false).unwrap();
    assert!(proposed
        .iter()
        .any(|p| p.action == ProposalAction::AdjustPriority && p.target == "all_daemons"));
}

#[test]
fn test_rules_engine_integration_smoke() {
    // The full core rule set evaluates cleanly against an empty store.
    let (ssot, publisher, clock) = setup();
    let mut rules = RulesEngine::new(clock);
    let outcomes = rules.evaluate_all(&ssot, &publisher, false).unwrap();
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|o| o.status == RuleStatus::Ok));
}

#[tokio::test]
async fn test_noop_hooks() {
    let mut hooks = NoopHooks;
    let receipt = hooks
        .enact(ProposalAction::EnableDaemon, "kraken")
        .await
        .unwrap();
    assert_eq!(receipt, "noop");
}
