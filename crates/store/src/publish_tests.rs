// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

const EVT_SENSE: EventType = EventType::new(Component::Watcher, "sense");

#[test]
fn test_publish_renders_type_and_source() {
    let ssot = Ssot::open_in_memory().unwrap();
    let publisher = Publisher::for_component(Component::Watcher, "90");

    let id = publisher
        .publish(&ssot, &EVT_SENSE, "SENSE:1", json!({"cpu": 12.5}))
        .unwrap();
    assert!(id > 0);

    let event = ssot.read_last_of_type("hfo.gen90.p0.watcher.sense").unwrap().unwrap();
    assert_eq!(event.source, "hfo_p0_watcher_gen90");
    assert_eq!(event.subject, "SENSE:1");
    assert_eq!(event.payload().get("cpu").and_then(|v| v.as_f64()), Some(12.5));
}

#[test]
fn test_envelope_completeness_on_wire() {
    let ssot = Ssot::open_in_memory().unwrap();
    let publisher = Publisher::for_component(Component::Watcher, "90");
    publisher
        .publish(&ssot, &EVT_SENSE, "SENSE:2", json!({}))
        .unwrap();

    let event = ssot.read_last_matching("%watcher%").unwrap().unwrap();
    for key in ["specversion", "type", "source", "subject", "time", "data"] {
        assert!(event.data.get(key).is_some(), "missing envelope key {key}");
    }
    assert_eq!(
        event.data.get("time"),
        event.data.get("timestamp"),
        "legacy timestamp must mirror time"
    );
}

#[test]
fn test_signal_block_injected_only_when_absent() {
    let ssot = Ssot::open_in_memory().unwrap();
    let publisher = Publisher::for_component(Component::Kraken, "90");
    let signal = SignalMeta {
        port: "P6".into(),
        model: "gemma3:12b".into(),
        latency_ms: 120.0,
        tokens_out: 64,
    };
    const EVT_PULSE: EventType = EventType::new(Component::Kraken, "loop.pulse");

    publisher
        .publish_with_signal(&ssot, &EVT_PULSE, "PULSE:1", json!({"n": 1}), &signal)
        .unwrap();
    let event = ssot.read_last_matching("%loop.pulse%").unwrap().unwrap();
    assert_eq!(
        event.payload().pointer("/signal/model").and_then(|v| v.as_str()),
        Some("gemma3:12b")
    );

    // Caller-provided signal must win.
    publisher
        .publish_with_signal(
            &ssot,
            &EVT_PULSE,
            "PULSE:2",
            json!({"n": 2, "signal": {"model": "caller"}}),
            &signal,
        )
        .unwrap();
    let event = ssot.read_last_matching("%loop.pulse%").unwrap().unwrap();
    assert_eq!(
        event.payload().pointer("/signal/model").and_then(|v| v.as_str()),
        Some("caller")
    );
}

#[test]
fn test_publish_fault_carries_kind_tag() {
    let ssot = Ssot::open_in_memory().unwrap();
    let publisher = Publisher::for_component(Component::SpellGate, "90");
    const EVT_ERROR: EventType = EventType::new(Component::SpellGate, "error");

    publisher
        .publish_fault(
            &ssot,
            &EVT_ERROR,
            "DAEMON_DEATH:singer:123",
            hfo_core::FaultKind::Dead,
            "pid 123 no longer alive",
            json!({"pid": 123}),
        )
        .unwrap();

    let event = ssot.read_last_matching("%spell_gate.error%").unwrap().unwrap();
    assert_eq!(
        event.payload().get("kind").and_then(|v| v.as_str()),
        Some("DEAD")
    );
}

#[test]
fn test_distinct_publishes_get_distinct_hashes() {
    // Envelope ids/timestamps differ per publish, so identical payloads
    // still land as separate rows.
    let ssot = Ssot::open_in_memory().unwrap();
    let publisher = Publisher::for_component(Component::Watcher, "90");
    publisher.publish(&ssot, &EVT_SENSE, "S", json!({"x": 1})).unwrap();
    publisher.publish(&ssot, &EVT_SENSE, "S", json!({"x": 1})).unwrap();
    assert_eq!(ssot.event_count().unwrap(), 2);
    assert_eq!(ssot.duplicate_hashes().unwrap(), 0);
}
