// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hfo-supervisor: The spell gate.
//!
//! Registry-driven process lifecycle: preflight, summon, scrying, banish,
//! sending, watchdog. Every daemon birth and death lands on the stigmergy
//! trail; daemon PIDs persist in a single-writer state file guarded by an
//! advisory lock.

mod error;
mod gate;
mod preflight;
mod process;
mod registry;
mod state;

pub use error::GateError;
pub use gate::{
    BanishReceipt, BanishStatus, DaemonStatusView, FleetView, Gate, GateOptions, SummonReceipt,
    SummonStatus, WatchdogEntry, WatchdogReport,
};
pub use preflight::{PreflightCheck, PreflightReport};
pub use process::pid_alive;
pub use registry::{builtin_registry, Registry};
pub use state::{DaemonRecord, SpellState};
