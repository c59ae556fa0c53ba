// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon specifications — the static contract a supervisor needs to
//! summon a worker without executing anything.

use crate::event_type::Port;
use serde::Serialize;
use std::path::PathBuf;

/// Which model lanes a daemon requires before it can be summoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelNeed {
    None,
    Cheap,
    Expensive,
    Both,
}

impl ModelNeed {
    pub fn needs_cheap(self) -> bool {
        matches!(self, ModelNeed::Cheap | ModelNeed::Both)
    }

    pub fn needs_expensive(self) -> bool {
        matches!(self, ModelNeed::Expensive | ModelNeed::Both)
    }

    pub fn needs_any(self) -> bool {
        !matches!(self, ModelNeed::None)
    }
}

/// A spawnable worker and its runtime contract.
///
/// `program` + `default_args` form the typed spawn contract: preflight can
/// verify the runnable exists and show the exact command line without
/// executing it.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonSpec {
    /// Unique short key used on the CLI and in state files.
    pub key: String,
    /// Display name.
    pub display_name: String,
    /// Capability port.
    pub port: Port,
    /// Port commander title (ownership string).
    pub commander: String,
    /// Runnable artifact.
    pub program: PathBuf,
    /// Default arguments appended after the program.
    pub default_args: Vec<String>,
    pub model_need: ModelNeed,
    /// Specific model id that must be available, when one is pinned.
    pub required_model: Option<String>,
    /// Minimum model-memory budget in GB (0 = no requirement).
    pub min_memory_gb: f64,
    /// Cycle interval in seconds (0 = one-shot).
    pub cycle_interval_s: f64,
    /// Boot priority, 1 = highest.
    pub priority: u8,
    /// Spell name recorded on summon receipts.
    pub spell_cast: String,
    /// False means the watchdog will not resurrect it.
    pub is_persistent: bool,
}

impl DaemonSpec {
    /// The full command line this spec would launch, for dry runs.
    pub fn command_line(&self, extra_args: &[String]) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.default_args.iter().cloned());
        parts.extend(extra_args.iter().cloned());
        parts.join(" ")
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
