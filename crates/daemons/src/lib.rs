// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hfo-daemons: The worker fleet.
//!
//! Every daemon here implements the common skeleton from hfo-worker and
//! coordinates with the rest of the fabric exclusively through the
//! stigmergy trail.

pub mod kraken;
pub mod meadows;
pub mod prospector;
pub mod queue;
pub mod singer;
pub mod watcher;

pub use kraken::KrakenDaemon;
pub use meadows::{EnactmentHooks, MeadowsDaemon, NoopHooks, SpellGateHooks};
pub use prospector::ProspectorDaemon;
pub use queue::{ComputeQueue, Lane, QueueDeps, Work, WorkItem, WorkResult, WorkStatus};
pub use singer::SingerDaemon;
pub use watcher::WatcherDaemon;
