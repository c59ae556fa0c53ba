// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hfo-anchor: The dimensional anchor.
//!
//! Pins a baseline of the fabric (resources, governance files, fleet,
//! loaded models, store sizes) under an integrity hash, then detects
//! drift across ten named dimensions. A baseline whose stored hash
//! disagrees with its content is tampered: checks refuse until the
//! anchor is released and re-set.

mod baseline;
mod drift;
mod spells;
mod state;

pub use baseline::{capture_baseline, compute_anchor_hash, Baseline};
pub use drift::{detect_drift, DriftMap};
pub use spells::{Anchor, AnchorError, AnchorReceipt, CheckOutcome};
pub use state::AnchorState;
