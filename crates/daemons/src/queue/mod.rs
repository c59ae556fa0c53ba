// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The P7 compute queue: two priority lanes over one store.
//!
//! The cheap lane serializes small fixed-cost work (embeddings); the
//! expensive lane serializes generation. Each lane runs exactly one
//! item at a time; every completion lands on the trail.

mod item;
mod work;

pub use item::{Lane, Work, WorkItem, WorkResult, WorkStatus};

use hfo_core::{Component, EventType};
use hfo_model::PrimaryClient;
use hfo_store::{Publisher, Ssot};
use hfo_worker::WorkerError;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::BinaryHeap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const EVT_STARTED: EventType = EventType::new(Component::ComputeQueue, "started");
const EVT_COMPLETED: EventType = EventType::new(Component::ComputeQueue, "completed");
const EVT_ERROR: EventType = EventType::new(Component::ComputeQueue, "error");
const EVT_DRAINED: EventType = EventType::new(Component::ComputeQueue, "drained");

const IDLE_POLL: Duration = Duration::from_millis(100);

/// What a running queue needs. Each lane opens its own store handle on
/// `db_path`.
#[derive(Clone)]
pub struct QueueDeps {
    pub db_path: PathBuf,
    pub publisher: Publisher,
    pub dry_run: bool,
}

/// The two-lane queue. Submissions may happen before or during `run`.
pub struct ComputeQueue {
    cheap: Arc<Mutex<BinaryHeap<WorkItem>>>,
    expensive: Arc<Mutex<BinaryHeap<WorkItem>>>,
    seq: AtomicU64,
    cancel: CancellationToken,
}

impl ComputeQueue {
    pub fn new() -> Self {
        Self {
            cheap: Arc::new(Mutex::new(BinaryHeap::new())),
            expensive: Arc::new(Mutex::new(BinaryHeap::new())),
            seq: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    /// Queue a work item. Returns its id.
    pub fn submit(&self, priority: i32, work: Work) -> String {
        let id = nanoid::nanoid!(10);
        let item = WorkItem {
            id: id.clone(),
            priority,
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
            work,
        };
        let lane = item.work.lane();
        match lane {
            Lane::Cheap => self.cheap.lock().push(item),
            Lane::Expensive => self.expensive.lock().push(item),
        }
        debug!(%id, %lane, "submitted");
        id
    }

    /// Pending items per lane (cheap, expensive).
    pub fn pending(&self) -> (usize, usize) {
        (self.cheap.lock().len(), self.expensive.lock().len())
    }

    /// Token that stops both lanes.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start both lane workers. With `drain` they exit once their queue
    /// is empty; otherwise they run until the stop token fires.
    pub async fn run(&self, deps: &QueueDeps, drain: bool) -> Result<Vec<WorkResult>, WorkerError> {
        let (cheap_pending, expensive_pending) = self.pending();
        {
            let ssot = Ssot::open(&deps.db_path)?;
            deps.publisher.publish(
                &ssot,
                &EVT_STARTED,
                &format!("QUEUE_START:{}_items", cheap_pending + expensive_pending),
                json!({
                    "cheap_pending": cheap_pending,
                    "expensive_pending": expensive_pending,
                    "drain": drain,
                }),
            )?;
        }

        let cheap_task = tokio::spawn(lane_loop(
            Lane::Cheap,
            self.cheap.clone(),
            deps.clone(),
            self.cancel.clone(),
            drain,
        ));
        let expensive_task = tokio::spawn(lane_loop(
            Lane::Expensive,
            self.expensive.clone(),
            deps.clone(),
            self.cancel.clone(),
            drain,
        ));

        let mut results = cheap_task
            .await
            .map_err(|e| WorkerError::internal(e.to_string()))??;
        results.extend(
            expensive_task
                .await
                .map_err(|e| WorkerError::internal(e.to_string()))??,
        );

        if drain {
            let completed = results
                .iter()
                .filter(|r| r.status == WorkStatus::Completed)
                .count();
            let errored = results.len() - completed;
            let ssot = Ssot::open(&deps.db_path)?;
            deps.publisher.publish(
                &ssot,
                &EVT_DRAINED,
                &format!("QUEUE_DRAINED:{}_completed", completed),
                json!({"completed": completed, "errored": errored}),
            )?;
            info!(completed, errored, "queue drained");
        }

        Ok(results)
    }
}

impl Default for ComputeQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// One lane: pop, process, publish, repeat. Exactly one item in flight.
async fn lane_loop(
    lane: Lane,
    heap: Arc<Mutex<BinaryHeap<WorkItem>>>,
    deps: QueueDeps,
    cancel: CancellationToken,
    drain: bool,
) -> Result<Vec<WorkResult>, WorkerError> {
    let ssot = Ssot::open(&deps.db_path)?;
    let primary = PrimaryClient::from_env()?;
    let mut results = Vec::new();

    loop {
        let item = heap.lock().pop();
        let Some(item) = item else {
            if drain {
                break;
            }
            if cancel.is_cancelled() {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(IDLE_POLL) => continue,
            }
        };

        let result = work::process(&item, lane, &ssot, &primary, deps.dry_run).await;
        let (event_type, subject) = match result.status {
            WorkStatus::Completed => (
                &EVT_COMPLETED,
                format!("{}:{}:{}", lane, item.work.kind(), item.id),
            ),
            WorkStatus::Error => (
                &EVT_ERROR,
                format!("{}:{}:{}", lane, item.work.kind(), item.id),
            ),
        };
        deps.publisher.publish(
            &ssot,
            event_type,
            &subject,
            json!({
                "item_id": item.id,
                "lane": lane,
                "work_type": item.work.kind(),
                "priority": item.priority,
                "status": result.status,
                "elapsed_ms": result.elapsed_ms,
                "error": result.error,
            }),
        )?;
        results.push(result);
    }

    Ok(results)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
