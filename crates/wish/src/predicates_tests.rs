// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hfo_store::Publisher;

#[test]
fn test_predicate_name_is_deterministic() {
    assert_eq!(predicate_name("WISH-A1B2C3D4-00"), "wish_v2_wish_a1b2c3d4_00");
    assert_eq!(predicate_name("WISH-A1B2C3D4-00"), predicate_name("WISH-A1B2C3D4-00"));
}

#[test]
fn test_always_pass_stub_grants() {
    let ssot = Ssot::open_in_memory().unwrap();
    let (granted, violations) = PredicateCheck::AlwaysPass.evaluate(&ssot);
    assert!(granted);
    assert!(violations.is_empty());
}

#[test]
fn test_events_exist_check() {
    let ssot = Ssot::open_in_memory().unwrap();
    let check = PredicateCheck::EventsExist {
        pattern: "%watcher%".into(),
        window_minutes: 60,
    };

    let (granted, violations) = check.evaluate(&ssot);
    assert!(!granted);
    assert_eq!(violations.len(), 1);

    Publisher::with_source("hfo_test_gen90", "90")
        .publish_raw(&ssot, "hfo.gen90.p0.watcher.sense", "S", serde_json::json!({}))
        .unwrap();
    let (granted, _) = check.evaluate(&ssot);
    assert!(granted);
}

#[test]
fn test_registry_register_and_evaluate() {
    let ssot = Ssot::open_in_memory().unwrap();
    let mut registry = PredicateRegistry::new();
    assert!(registry.is_empty());

    registry.register(Predicate {
        name: "wish_v2_test_00".into(),
        given: "a known good state".into(),
        when: "the check runs".into(),
        then: "it grants".into(),
        check: PredicateCheck::AlwaysPass,
    });

    assert!(registry.contains("wish_v2_test_00"));
    assert_eq!(registry.len(), 1);

    let verdict = registry.evaluate("wish_v2_test_00", &ssot).unwrap();
    assert_eq!(verdict.verdict, "GRANTED");
    assert!(registry.evaluate("missing", &ssot).is_none());
}
