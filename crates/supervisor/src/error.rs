// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use thiserror::Error;

/// Spell gate errors.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("unknown daemon key: {key} (known: {known})")]
    UnknownDaemon { key: String, known: String },

    #[error("another supervisor holds the lock at {0}")]
    Locked(PathBuf),

    #[error("state file error: {0}")]
    State(#[from] std::io::Error),

    #[error("state file serialization: {0}")]
    StateSerde(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] hfo_store::StoreError),

    #[error("spawn failed: {0}")]
    Spawn(String),
}
