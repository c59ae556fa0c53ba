// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hfo-wish: The five-pass pipeline compiler.
//!
//! Intent string -> structured scenarios -> task cards -> registered
//! predicates -> verdicts -> artifact receipt. Every pass is idempotent
//! from persisted state, fail-closed, and audited with one event per
//! pass carrying the wish id.

mod compiler;
mod passes;
mod predicates;
mod state;

pub use compiler::{Compiler, WishError};
pub use passes::{extract_task_cards, validate_feature_text};
pub use predicates::{predicate_name, Predicate, PredicateCheck, PredicateRegistry, Verdict};
pub use state::{
    PassResult, PassStatus, PipelineStatus, PipelineStore, TaskCard, WishPipeline,
};
