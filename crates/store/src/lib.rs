// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hfo-store: The SSOT — an embedded SQLite store holding the append-only
//! stigmergy event log, the document corpus, and embedding vectors.
//!
//! The event log is the only shared mutable state in the fabric; every
//! daemon coordinates exclusively through it.

mod documents;
mod embeddings;
mod error;
mod events;
mod publish;
mod ssot;

pub use documents::Document;
pub use embeddings::cosine_similarity;
pub use error::StoreError;
pub use events::{SsotStats, StoredEvent};
pub use publish::{Publisher, SignalMeta};
pub use ssot::Ssot;
