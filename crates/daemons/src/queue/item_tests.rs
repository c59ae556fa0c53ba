// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::BinaryHeap;
use yare::parameterized;

fn item(priority: i32, seq: u64) -> WorkItem {
    WorkItem {
        id: format!("i{priority}-{seq}"),
        priority,
        seq,
        work: Work::EmbedBatch { batch_size: 10 },
    }
}

#[parameterized(
    embed = { Work::EmbedBatch { batch_size: 1 }, Lane::Cheap },
    search = { Work::EmbedSearch { query: "q".into(), top_k: 5 }, Lane::Cheap },
    generate = { Work::Generate { prompt: "p".into(), model: None }, Lane::Expensive },
    summarize = { Work::Summarize { doc_id: 1 }, Lane::Expensive },
    classify = { Work::Classify { doc_id: 1 }, Lane::Expensive },
    evaluate = { Work::Evaluate { doc_id: 1 }, Lane::Expensive },
)]
fn test_lane_routing(work: Work, lane: Lane) {
    assert_eq!(work.lane(), lane);
}

#[test]
fn test_heap_pops_lowest_priority_first() {
    let mut heap = BinaryHeap::new();
    heap.push(item(5, 1));
    heap.push(item(1, 2));
    heap.push(item(3, 3));

    assert_eq!(heap.pop().unwrap().priority, 1);
    assert_eq!(heap.pop().unwrap().priority, 3);
    assert_eq!(heap.pop().unwrap().priority, 5);
}

#[test]
fn test_equal_priority_pops_in_submission_order() {
    let mut heap = BinaryHeap::new();
    heap.push(item(5, 30));
    heap.push(item(5, 10));
    heap.push(item(5, 20));

    assert_eq!(heap.pop().unwrap().seq, 10);
    assert_eq!(heap.pop().unwrap().seq, 20);
    assert_eq!(heap.pop().unwrap().seq, 30);
}

#[test]
fn test_work_serializes_with_type_tag() {
    let json = serde_json::to_value(Work::Summarize { doc_id: 7 }).unwrap();
    assert_eq!(json["work_type"], "summarize");
    assert_eq!(json["doc_id"], 7);
}
