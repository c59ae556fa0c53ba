// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource pressure sensing for worker gates and batch sizing.

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Pressure levels, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pressure {
    Idle,
    Nominal,
    Elevated,
    Throttled,
    Critical,
}

impl std::fmt::Display for Pressure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Pressure::Idle => "IDLE",
            Pressure::Nominal => "NOMINAL",
            Pressure::Elevated => "ELEVATED",
            Pressure::Throttled => "THROTTLED",
            Pressure::Critical => "CRITICAL",
        };
        write!(f, "{tag}")
    }
}

/// Classify from raw cpu% and free RAM.
pub fn classify_pressure(cpu_percent: f64, ram_free_gb: f64) -> Pressure {
    if ram_free_gb < 2.0 {
        Pressure::Critical
    } else if cpu_percent > 90.0 {
        Pressure::Throttled
    } else if cpu_percent > 70.0 || ram_free_gb < 4.0 {
        Pressure::Elevated
    } else if cpu_percent > 40.0 {
        Pressure::Nominal
    } else {
        Pressure::Idle
    }
}

/// Quick live sample.
pub fn sense_pressure() -> Pressure {
    let mut sys = System::new_all();
    sys.refresh_all();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu();

    let cpu = sys.global_cpu_info().cpu_usage() as f64;
    let total = sys.total_memory() as f64 / 1e9;
    let used = sys.used_memory() as f64 / 1e9;
    classify_pressure(cpu, (total - used).max(0.0))
}

#[cfg(test)]
#[path = "pressure_tests.rs"]
mod tests;
