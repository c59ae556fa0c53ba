// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn deps(dir: &tempfile::TempDir) -> QueueDeps {
    QueueDeps {
        db_path: dir.path().join("ssot.sqlite"),
        publisher: Publisher::for_component(Component::ComputeQueue, "90"),
        dry_run: true,
    }
}

fn seed_docs(db_path: &std::path::Path, n: usize) {
    let ssot = Ssot::open(db_path).unwrap();
    for i in 0..n {
        ssot.insert_document(
            &format!("doc{i}"),
            &format!("document body number {i}"),
            "",
            "test",
            "P6",
            "note",
            300,
        )
        .unwrap();
    }
}

#[tokio::test]
async fn test_drain_embeds_and_publishes_completions() {
    let dir = tempdir().unwrap();
    let deps = deps(&dir);
    seed_docs(&deps.db_path, 3);

    let queue = ComputeQueue::new();
    queue.submit(5, Work::EmbedBatch { batch_size: 10 });
    assert_eq!(queue.pending(), (1, 0));

    let results = queue.run(&deps, true).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, WorkStatus::Completed);
    assert_eq!(queue.pending(), (0, 0));

    let ssot = Ssot::open(&deps.db_path).unwrap();
    assert_eq!(ssot.embedding_count().unwrap(), 3);
    assert!(ssot.read_last_matching("%compute_queue.started").unwrap().is_some());
    assert!(ssot.read_last_matching("%compute_queue.completed").unwrap().is_some());
    assert!(ssot.read_last_matching("%compute_queue.drained").unwrap().is_some());
}

#[tokio::test]
async fn test_search_ranks_by_similarity() {
    let dir = tempdir().unwrap();
    let deps = deps(&dir);
    seed_docs(&deps.db_path, 4);

    // Embed first so the search has an index to rank against.
    let queue = ComputeQueue::new();
    queue.submit(5, Work::EmbedBatch { batch_size: 10 });
    queue.run(&deps, true).await.unwrap();

    queue.submit(1, Work::EmbedSearch { query: "document body number 2".into(), top_k: 2 });
    let results = queue.run(&deps, true).await.unwrap();

    let search = results.last().unwrap();
    assert_eq!(search.status, WorkStatus::Completed);
    let hits = search.output.as_ref().unwrap()["hits"].as_array().unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn test_expensive_lane_summarize_and_missing_doc_error() {
    let dir = tempdir().unwrap();
    let deps = deps(&dir);
    seed_docs(&deps.db_path, 1);

    let queue = ComputeQueue::new();
    queue.submit(5, Work::Summarize { doc_id: 1 });
    queue.submit(5, Work::Summarize { doc_id: 999 });
    assert_eq!(queue.pending(), (0, 2));

    let mut results = queue.run(&deps, true).await.unwrap();
    results.sort_by(|a, b| a.id.cmp(&b.id));

    let completed: Vec<_> = results.iter().filter(|r| r.status == WorkStatus::Completed).collect();
    let errored: Vec<_> = results.iter().filter(|r| r.status == WorkStatus::Error).collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(errored.len(), 1);
    assert!(errored[0].error.as_deref().unwrap_or("").contains("not found"));

    let ssot = Ssot::open(&deps.db_path).unwrap();
    let doc = ssot.get_document(1).unwrap().unwrap();
    assert!(!doc.bluf.is_empty());
    assert!(ssot.read_last_matching("%compute_queue.error").unwrap().is_some());
}

#[tokio::test]
async fn test_lanes_run_independently() {
    let dir = tempdir().unwrap();
    let deps = deps(&dir);
    seed_docs(&deps.db_path, 2);

    let queue = ComputeQueue::new();
    queue.submit(5, Work::EmbedBatch { batch_size: 10 });
    queue.submit(5, Work::Evaluate { doc_id: 1 });
    queue.submit(5, Work::Classify { doc_id: 2 });

    let results = queue.run(&deps, true).await.unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.status == WorkStatus::Completed));

    let cheap = results.iter().filter(|r| r.lane == Lane::Cheap).count();
    let expensive = results.iter().filter(|r| r.lane == Lane::Expensive).count();
    assert_eq!(cheap, 1);
    assert_eq!(expensive, 2);
}

#[tokio::test]
async fn test_stop_request_ends_non_drain_run() {
    let dir = tempdir().unwrap();
    let deps = deps(&dir);

    let queue = ComputeQueue::new();
    let cancel = queue.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let results = queue.run(&deps, false).await.unwrap();
    assert!(results.is_empty());
}
