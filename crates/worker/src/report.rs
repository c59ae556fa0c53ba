// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cycle results and worker-level errors.

use hfo_core::FaultKind;
use std::collections::BTreeMap;
use thiserror::Error;

/// What one cycle produced. Tallies are merged into the worker's
/// cumulative totals and surfaced on heartbeats.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub tallies: BTreeMap<String, i64>,
    pub note: Option<String>,
}

impl CycleReport {
    pub fn tally(mut self, key: &str, count: i64) -> Self {
        *self.tallies.entry(key.to_string()).or_insert(0) += count;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A cycle failure: taxonomy kind plus human message. Workers never
/// propagate these by crashing; the runner turns them into events.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct WorkerError {
    pub kind: FaultKind,
    pub message: String,
}

impl WorkerError {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Internal, message)
    }
}

impl From<hfo_store::StoreError> for WorkerError {
    fn from(err: hfo_store::StoreError) -> Self {
        Self::new(err.fault_kind(), err.to_string())
    }
}

impl From<hfo_model::ModelError> for WorkerError {
    fn from(err: hfo_model::ModelError) -> Self {
        Self::new(err.fault_kind(), err.to_string())
    }
}
