// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Everything a worker cycle may touch.

use hfo_core::Paths;
use hfo_model::{PrimaryClient, SecondaryClient};
use hfo_store::{Publisher, Ssot};
use tokio_util::sync::CancellationToken;

/// Shared handles for one worker process. Owned by the runner; cycles
/// get `&mut` access so state stays with the worker's main task.
pub struct WorkerContext {
    pub paths: Paths,
    pub ssot: Ssot,
    pub publisher: Publisher,
    pub primary: PrimaryClient,
    pub secondary: Option<SecondaryClient>,
    pub generation: String,
    pub dry_run: bool,
    pub cancel: CancellationToken,
}

impl WorkerContext {
    /// Standard context for a daemon rooted at `paths`.
    pub fn new(
        paths: Paths,
        ssot: Ssot,
        publisher: Publisher,
        dry_run: bool,
    ) -> Result<Self, hfo_model::ModelError> {
        Ok(Self {
            paths,
            ssot,
            publisher,
            primary: PrimaryClient::from_env()?,
            secondary: SecondaryClient::from_env(),
            generation: hfo_core::env::generation(),
            dry_run,
            cancel: CancellationToken::new(),
        })
    }
}
