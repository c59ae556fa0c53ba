// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor state file: the only record of daemon PIDs across
//! invocations. Atomic write: temp file, fsync, rename.

use crate::error::GateError;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// One recorded daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonRecord {
    pub name: String,
    pub pid: u32,
    pub port: String,
    pub commander: String,
    pub script: String,
    pub args: Vec<String>,
    pub summoned_at: String,
    pub alive: bool,
    pub log_file: String,
    pub spell_cast: String,
    #[serde(default)]
    pub model: String,
}

/// The on-disk state shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpellState {
    #[serde(default)]
    pub daemons: BTreeMap<String, DaemonRecord>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl SpellState {
    /// Load, tolerating a missing or corrupt file.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Persist atomically: temp file, fsync, rename.
    pub fn save(&mut self, path: &Path) -> Result<(), GateError> {
        self.last_updated = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false));
        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
