// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::BTreeSet;

fn seed(ssot: &Ssot) -> Vec<i64> {
    let mut ids = Vec::new();
    for (title, words) in [("alpha", 500), ("beta", 1200), ("gamma", 90), ("delta", 800)] {
        let id = ssot
            .insert_document(
                title,
                &format!("{title} body content"),
                "",
                "test",
                "P6",
                "note",
                words,
            )
            .unwrap();
        ids.push(id);
    }
    ids
}

#[test]
fn test_counts_and_words() {
    let ssot = Ssot::open_in_memory().unwrap();
    seed(&ssot);
    assert_eq!(ssot.doc_count().unwrap(), 4);
    assert_eq!(ssot.total_words().unwrap(), 2590);
}

#[test]
fn test_medallion_counts_default_bronze() {
    let ssot = Ssot::open_in_memory().unwrap();
    seed(&ssot);
    let tiers = ssot.medallion_counts().unwrap();
    assert_eq!(tiers.get("bronze"), Some(&4));
}

#[test]
fn test_sample_unconsidered_excludes_and_filters() {
    let ssot = Ssot::open_in_memory().unwrap();
    let ids = seed(&ssot);

    let mut excluded = BTreeSet::new();
    excluded.insert(ids[0]);

    let docs = ssot.sample_unconsidered(&excluded, 200, 10).unwrap();
    let got: BTreeSet<i64> = docs.iter().map(|d| d.id).collect();
    // alpha excluded, gamma too thin (90 words)
    assert!(!got.contains(&ids[0]));
    assert!(!got.contains(&ids[2]));
    assert_eq!(got.len(), 2);
}

#[test]
fn test_sample_unconsidered_empty_when_all_seen() {
    let ssot = Ssot::open_in_memory().unwrap();
    let ids = seed(&ssot);
    let excluded: BTreeSet<i64> = ids.into_iter().collect();
    assert!(ssot.sample_unconsidered(&excluded, 0, 10).unwrap().is_empty());
}

#[test]
fn test_get_document_previews_content() {
    let ssot = Ssot::open_in_memory().unwrap();
    let long = "x".repeat(10_000);
    let id = ssot
        .insert_document("long", &long, "", "test", "P6", "note", 10_000)
        .unwrap();
    let doc = ssot.get_document(id).unwrap().unwrap();
    assert_eq!(doc.content.len(), 4000);
    assert!(ssot.get_document(999_999).unwrap().is_none());
}

#[test]
fn test_update_bluf() {
    let ssot = Ssot::open_in_memory().unwrap();
    let ids = seed(&ssot);
    ssot.update_bluf(ids[0], "a sharper summary").unwrap();
    let doc = ssot.get_document(ids[0]).unwrap().unwrap();
    assert_eq!(doc.bluf, "a sharper summary");
}

#[test]
fn test_docs_without_embedding_shrinks_as_embedded() {
    let ssot = Ssot::open_in_memory().unwrap();
    let ids = seed(&ssot);
    assert_eq!(ssot.docs_without_embedding(10).unwrap().len(), 4);
    ssot.upsert_embedding(ids[0], "nomic-embed-text", &[0.1, 0.2])
        .unwrap();
    assert_eq!(ssot.docs_without_embedding(10).unwrap().len(), 3);
}
