// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work items and their lane routing.

use serde::Serialize;
use std::cmp::Ordering;

/// The two compute lanes. One item in flight per lane, ever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Cheap,
    Expensive,
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lane::Cheap => write!(f, "cheap"),
            Lane::Expensive => write!(f, "expensive"),
        }
    }
}

/// What a work item does. The variant decides the lane.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "work_type", rename_all = "snake_case")]
pub enum Work {
    EmbedBatch { batch_size: i64 },
    EmbedSearch { query: String, top_k: usize },
    Generate { prompt: String, model: Option<String> },
    Summarize { doc_id: i64 },
    Classify { doc_id: i64 },
    Evaluate { doc_id: i64 },
}

impl Work {
    pub fn lane(&self) -> Lane {
        match self {
            Work::EmbedBatch { .. } | Work::EmbedSearch { .. } => Lane::Cheap,
            Work::Generate { .. }
            | Work::Summarize { .. }
            | Work::Classify { .. }
            | Work::Evaluate { .. } => Lane::Expensive,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Work::EmbedBatch { .. } => "embed_batch",
            Work::EmbedSearch { .. } => "embed_search",
            Work::Generate { .. } => "generate",
            Work::Summarize { .. } => "summarize",
            Work::Classify { .. } => "classify",
            Work::Evaluate { .. } => "evaluate",
        }
    }
}

/// A queued item. Within a lane, order is (priority, submission seq);
/// lower priority is more urgent.
#[derive(Debug, Clone, Serialize)]
pub struct WorkItem {
    pub id: String,
    pub priority: i32,
    pub seq: u64,
    pub work: Work,
}

impl PartialEq for WorkItem {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for WorkItem {}

impl PartialOrd for WorkItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WorkItem {
    // BinaryHeap is a max-heap: the greatest item is the most urgent,
    // so compare reversed.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Terminal status of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Completed,
    Error,
}

/// What came out of one item.
#[derive(Debug, Clone, Serialize)]
pub struct WorkResult {
    pub id: String,
    pub lane: Lane,
    pub status: WorkStatus,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
