// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use serde_json::json;

fn sample() -> Envelope {
    Envelope::new(
        "hfo.gen90.p7.spell_gate.summon",
        "hfo_p7_spell_gate_gen90",
        "SUMMON:watcher:P0:4242",
        json!({"daemon_key": "watcher", "pid": 4242}),
    )
}

#[test]
fn test_new_fills_required_fields() {
    let env = sample();
    assert_eq!(env.specversion, SPEC_VERSION);
    assert_eq!(env.id.len(), 32);
    assert!(env.id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(env.time, env.timestamp);
    assert_eq!(env.datacontenttype, DATA_CONTENT_TYPE);
    assert!(!env.subject.is_empty());
    assert!(env.data.is_object());
}

#[test]
fn test_traceparent_shape() {
    let env = sample();
    let parts: Vec<&str> = env.traceparent.split('-').collect();
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0], "00");
    assert_eq!(parts[1].len(), 32);
    assert_eq!(parts[2].len(), 16);
    assert_eq!(parts[3], "01");
}

#[test]
fn test_canonical_json_sorts_keys() {
    let env = sample();
    let canon = env.canonical_json().unwrap();
    // "data" must come before "datacontenttype", which comes before "id"
    let data_pos = canon.find("\"data\"").unwrap();
    let dct_pos = canon.find("\"datacontenttype\"").unwrap();
    let id_pos = canon.find("\"id\"").unwrap();
    assert!(data_pos < dct_pos);
    assert!(dct_pos < id_pos);
    // Compact: no space after colons
    assert!(!canon.contains("\": "));
    assert!(!canon.ends_with('\n'));
}

#[test]
fn test_hash_is_stable() {
    let env = sample();
    assert_eq!(env.content_hash().unwrap(), env.content_hash().unwrap());
}

#[test]
fn test_hash_changes_with_type_and_subject() {
    let env = sample();
    let mut retyped = env.clone();
    retyped.event_type = "hfo.gen90.p7.spell_gate.banish".to_string();
    let mut resubjected = env.clone();
    resubjected.subject = "SUMMON:singer:P4:4242".to_string();

    let base = env.content_hash().unwrap();
    assert_ne!(base, retyped.content_hash().unwrap());
    assert_ne!(base, resubjected.content_hash().unwrap());
}

#[test]
fn test_hash_is_64_hex_lowercase() {
    let hash = sample().content_hash().unwrap();
    assert_eq!(hash.len(), 64);
    assert!(hash
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn test_wire_roundtrip_preserves_hash() {
    let env = sample();
    let wire = serde_json::to_string(&env).unwrap();
    let back: Envelope = serde_json::from_str(&wire).unwrap();
    assert_eq!(env.content_hash().unwrap(), back.content_hash().unwrap());
}

#[test]
fn test_type_field_renamed_on_wire() {
    let env = sample();
    let value = serde_json::to_value(&env).unwrap();
    assert!(value.get("type").is_some());
    assert!(value.get("event_type").is_none());
}

proptest! {
    // Hashing the canonical serialization is a pure function of content.
    #[test]
    fn prop_hash_stability(
        event_type in "[a-z0-9.]{1,40}",
        subject in ".{0,60}",
        key in "[a-z_]{1,12}",
        val in any::<i64>(),
    ) {
        let env = Envelope::new(&event_type, "hfo_test_gen90", &subject, json!({ key: val }));
        prop_assert_eq!(env.content_hash().unwrap(), env.content_hash().unwrap());
    }

    // Canonicalization is insensitive to data-map insertion order.
    #[test]
    fn prop_canonical_ignores_insertion_order(a in any::<i64>(), b in any::<i64>()) {
        let mut first = serde_json::Map::new();
        first.insert("alpha".into(), json!(a));
        first.insert("beta".into(), json!(b));
        let mut second = serde_json::Map::new();
        second.insert("beta".into(), json!(b));
        second.insert("alpha".into(), json!(a));

        let one = Envelope::new("t", "s", "sub", serde_json::Value::Object(first));
        let mut two = one.clone();
        two.data = serde_json::Value::Object(second);
        prop_assert_eq!(one.content_hash().unwrap(), two.content_hash().unwrap());
    }
}
