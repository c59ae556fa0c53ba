// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hfo_core::Paths;
use hfo_store::{Publisher, Ssot};
use tempfile::tempdir;

#[test]
fn test_cluster_scan_groups_similar_vectors() {
    let embeddings = vec![
        (1, vec![1.0, 0.0, 0.0]),
        (2, vec![0.99, 0.05, 0.0]),
        (3, vec![0.0, 1.0, 0.0]),
        (4, vec![0.02, 0.98, 0.0]),
        (5, vec![0.0, 0.0, 1.0]),
    ];

    let (clusters, outliers) = cluster_scan(&embeddings, 0.82, 0.30);

    assert_eq!(clusters.len(), 2);
    assert!(clusters.contains(&vec![1, 2]));
    assert!(clusters.contains(&vec![3, 4]));
    // Doc 5 is orthogonal to everything.
    assert_eq!(outliers, vec![5]);
}

#[test]
fn test_cluster_scan_transitive_grouping() {
    // a~b and b~c but a!~c still lands in one cluster.
    let embeddings = vec![
        (1, vec![1.0, 0.0]),
        (2, vec![0.9, 0.435]),
        (3, vec![0.62, 0.78]),
    ];
    let (clusters, _) = cluster_scan(&embeddings, 0.85, 0.30);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0], vec![1, 2, 3]);
}

#[test]
fn test_cluster_scan_empty_and_single() {
    let (clusters, outliers) = cluster_scan(&[], 0.82, 0.30);
    assert!(clusters.is_empty());
    assert!(outliers.is_empty());

    // A lone vector is neither cluster nor outlier.
    let (clusters, outliers) = cluster_scan(&[(1, vec![1.0])], 0.82, 0.30);
    assert!(clusters.is_empty());
    assert!(outliers.is_empty());
}

#[tokio::test]
async fn test_reach_zero_batch_is_inert() {
    let dir = tempdir().unwrap();
    let ssot = Ssot::open_in_memory().unwrap();
    let publisher = Publisher::for_component(Component::Kraken, "90");
    let mut cx = WorkerContext::new(Paths::new(dir.path()), ssot, publisher, false).unwrap();

    let mut arm = CheapArm::new();
    let discovery = arm.reach(&mut cx, 0).await.unwrap();
    assert!(discovery.embedded.is_empty());
    assert_eq!(cx.ssot.event_count().unwrap(), 0);
}

#[tokio::test]
async fn test_reach_dry_run_publishes_nothing_but_scans() {
    let dir = tempdir().unwrap();
    let ssot = Ssot::open_in_memory().unwrap();
    let id = ssot
        .insert_document("doc", "body", "", "t", "P6", "note", 100)
        .unwrap();
    ssot.upsert_embedding(id, "m", &[1.0, 0.0]).unwrap();
    let publisher = Publisher::for_component(Component::Kraken, "90");
    let mut cx = WorkerContext::new(Paths::new(dir.path()), ssot, publisher, true).unwrap();

    let mut arm = CheapArm::new();
    let discovery = arm.reach(&mut cx, 10).await.unwrap();
    assert!(discovery.embedded.is_empty());
    assert_eq!(cx.ssot.event_count().unwrap(), 0);
}
