// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn test_strip_think_tags() {
    let text = "<think>planning my answer</think>The answer is 42.";
    assert_eq!(strip_think_tags(text), "The answer is 42.");
}

#[test]
fn test_strip_think_tags_multiline() {
    let text = "<think>\nline one\nline two\n</think>\nresult";
    assert_eq!(strip_think_tags(text), "result");
}

#[test]
fn test_strip_think_tags_keeps_all_think_output() {
    // A response that is nothing but thinking keeps its content.
    let text = "<think>only thoughts</think>";
    assert_eq!(strip_think_tags(text), text.trim());
}

#[parameterized(
    plain = { "[1, 2]", "[1, 2]" },
    fenced = { "```\n[1, 2]\n```", "[1, 2]" },
    fenced_lang = { "```json\n[1, 2]\n```", "[1, 2]" },
    untouched = { "no fences here", "no fences here" },
)]
fn test_strip_code_fences(input: &str, expected: &str) {
    assert_eq!(strip_code_fences(input), expected);
}

#[test]
fn test_extract_direct_array() {
    let items = extract_json_array(r#"[{"a": 1}, {"b": 2}, 3]"#);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["a"], 1);
}

#[test]
fn test_extract_single_object_becomes_array() {
    let items = extract_json_array(r#"{"song_type": "strife"}"#);
    assert_eq!(items.len(), 1);
}

#[test]
fn test_extract_array_with_surrounding_prose() {
    let text = "Here are the proposals:\n[{\"a\": 1}]\nHope that helps!";
    let items = extract_json_array(text);
    assert_eq!(items.len(), 1);
}

#[test]
fn test_extract_from_fenced_output() {
    let text = "```json\n[{\"spell_name\": \"SHATTER\"}]\n```";
    let items = extract_json_array(text);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["spell_name"], "SHATTER");
}

#[test]
fn test_extract_scans_loose_objects() {
    let text = "first {\"a\": 1} then {\"b\": {\"nested\": true}} done";
    let items = extract_json_array(text);
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["b"]["nested"], true);
}

#[test]
fn test_extract_empty_on_garbage() {
    assert!(extract_json_array("no json at all").is_empty());
    assert!(extract_json_array("").is_empty());
}
