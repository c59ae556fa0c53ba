// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use hfo_core::{EnvelopeError, FaultKind};
use std::path::PathBuf;
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not open SSOT at {0}: {1}")]
    Open(PathBuf, #[source] rusqlite::Error),

    #[error("SSOT query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("write contention persisted past retry ceiling: {0}")]
    Contended(#[source] rusqlite::Error),

    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    /// Taxonomy tag for error events.
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            StoreError::Open(..) | StoreError::Contended(..) => FaultKind::Unreachable,
            StoreError::Query(_) | StoreError::Io(_) | StoreError::Serde(_) => FaultKind::Internal,
            StoreError::Envelope(_) => FaultKind::ValidationFailed,
        }
    }
}
