// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock seam for cooldown and two-phase-proposal timing.
//!
//! Governance cooldowns span minutes; tests drive them with a fake
//! clock instead of sleeping.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Time source for engines with cooldown state.
pub trait Clock: Clone + Send + Sync {
    /// Monotonic instant for interval arithmetic.
    fn now(&self) -> Instant;

    /// Wall-clock milliseconds since the epoch.
    fn epoch_ms(&self) -> u64;

    /// Whole epoch seconds; proposal cooldowns are persisted in these.
    fn epoch_s(&self) -> u64 {
        self.epoch_ms() / 1000
    }
}

/// The real thing.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

#[derive(Debug)]
struct FakeNow {
    instant: Instant,
    epoch_ms: u64,
}

/// Controllable clock for tests. Both time axes advance together so a
/// cooldown expressed in `Instant`s and one persisted in epoch seconds
/// stay consistent.
#[derive(Clone)]
pub struct FakeClock {
    now: Arc<Mutex<FakeNow>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(FakeNow {
                instant: Instant::now(),
                epoch_ms: 1_000_000,
            })),
        }
    }

    /// Move both axes forward.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock();
        now.instant += duration;
        now.epoch_ms += duration.as_millis() as u64;
    }

    /// Pin the wall clock to a specific millisecond.
    pub fn set_epoch_ms(&self, ms: u64) {
        self.now.lock().epoch_ms = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.now.lock().instant
    }

    fn epoch_ms(&self) -> u64 {
        self.now.lock().epoch_ms
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
