// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hfo_core::{Component, FakeClock};
use hfo_store::Publisher;
use serde_json::json;

fn seed(ssot: &Ssot, source: &str, event_type: &str, n: usize) {
    let publisher = Publisher::with_source(source, "90");
    for i in 0..n {
        publisher
            .publish_raw(ssot, event_type, &format!("seed:{i}"), json!({"i": i}))
            .unwrap();
    }
}

fn tight_rule(threshold: i64, action: RuleAction, cooldown_s: u64) -> Rule {
    Rule::new(
        "T-R01",
        "test_rule",
        "events from test sources",
        RuleCondition::SourceEventCount {
            source_pattern: "%noisy%".into(),
            window_minutes: 60,
        },
        threshold,
        action,
        std::time::Duration::from_secs(cooldown_s),
    )
}

#[test]
fn test_condition_source_count() {
    let ssot = Ssot::open_in_memory().unwrap();
    seed(&ssot, "hfo_noisy_gen90", "hfo.gen90.x.tick", 3);
    let condition = RuleCondition::SourceEventCount {
        source_pattern: "%noisy%".into(),
        window_minutes: 60,
    };
    assert_eq!(condition.evaluate(&ssot).unwrap(), 3);
}

#[test]
fn test_condition_pattern_gap() {
    let ssot = Ssot::open_in_memory().unwrap();
    seed(&ssot, "hfo_agent_gen90", "hfo.gen90.p1.agent.perceive", 4);
    seed(&ssot, "hfo_agent_gen90", "hfo.gen90.p1.agent.yield", 1);
    let condition = RuleCondition::PatternGap {
        left: "%perceive%".into(),
        right: "%yield%".into(),
        window_minutes: 30,
    };
    assert_eq!(condition.evaluate(&ssot).unwrap(), 3);
}

#[test]
fn test_violation_publishes_event_and_enters_cooldown() {
    let ssot = Ssot::open_in_memory().unwrap();
    let publisher = Publisher::for_component(Component::Meadows, "90");
    let clock = FakeClock::new();
    let mut engine = RulesEngine::with_rules(clock.clone(), vec![tight_rule(2, RuleAction::Alert, 300)]);

    seed(&ssot, "hfo_noisy_gen90", "hfo.gen90.x.tick", 3);

    let outcomes = engine.evaluate_all(&ssot, &publisher, false).unwrap();
    assert_eq!(outcomes[0].status, RuleStatus::Violated);
    assert_eq!(outcomes[0].value, 3);
    assert_eq!(outcomes[0].action, Some(RuleAction::Alert));

    let event = ssot.read_last_matching("%l5.rule_violated").unwrap().unwrap();
    assert_eq!(
        event.payload().get("rule_id").and_then(|v| v.as_str()),
        Some("T-R01")
    );

    // Within cooldown the rule is skipped.
    let outcomes = engine.evaluate_all(&ssot, &publisher, false).unwrap();
    assert_eq!(outcomes[0].status, RuleStatus::Cooldown);

    // After cooldown it evaluates again.
    clock.advance(std::time::Duration::from_secs(301));
    let outcomes = engine.evaluate_all(&ssot, &publisher, false).unwrap();
    assert_eq!(outcomes[0].status, RuleStatus::Violated);
}

#[test]
fn test_under_threshold_is_ok() {
    let ssot = Ssot::open_in_memory().unwrap();
    let publisher = Publisher::for_component(Component::Meadows, "90");
    let mut engine =
        RulesEngine::with_rules(FakeClock::new(), vec![tight_rule(5, RuleAction::Advisory, 60)]);

    seed(&ssot, "hfo_noisy_gen90", "hfo.gen90.x.tick", 2);

    let outcomes = engine.evaluate_all(&ssot, &publisher, false).unwrap();
    assert_eq!(outcomes[0].status, RuleStatus::Ok);
    assert!(ssot.read_last_matching("%rule_violated").unwrap().is_none());
}

#[test]
fn test_dry_run_evaluates_without_publishing() {
    let ssot = Ssot::open_in_memory().unwrap();
    let publisher = Publisher::for_component(Component::Meadows, "90");
    let mut engine =
        RulesEngine::with_rules(FakeClock::new(), vec![tight_rule(0, RuleAction::Alert, 60)]);

    seed(&ssot, "hfo_noisy_gen90", "hfo.gen90.x.tick", 1);
    let before = ssot.event_count().unwrap();

    let outcomes = engine.evaluate_all(&ssot, &publisher, true).unwrap();
    assert_eq!(outcomes[0].status, RuleStatus::Violated);
    assert_eq!(ssot.event_count().unwrap(), before);
}

#[test]
fn test_core_rules_present() {
    let engine = RulesEngine::new(FakeClock::new());
    assert_eq!(engine.cooldown_of("L5-R01"), std::time::Duration::from_secs(300));
    assert_eq!(engine.cooldown_of("L5-R02"), std::time::Duration::from_secs(600));
}
