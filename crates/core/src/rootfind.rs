// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Root discovery and well-known paths.
//!
//! One strategy for every component: `HFO_ROOT` wins, otherwise walk
//! upward from the working directory looking for the governance marker
//! file, otherwise fall back to the working directory itself.

use std::path::{Path, PathBuf};

/// Governance marker file identifying the fabric root.
pub const ROOT_MARKER: &str = "AGENTS.md";

/// Resolve the fabric root.
pub fn find_root() -> PathBuf {
    if let Ok(root) = std::env::var("HFO_ROOT") {
        if !root.is_empty() {
            return PathBuf::from(root);
        }
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd).unwrap_or(cwd)
}

/// Walk upward from `start` looking for the marker file.
pub fn find_root_from(start: &Path) -> Option<PathBuf> {
    let mut candidate = Some(start);
    while let Some(dir) = candidate {
        if dir.join(ROOT_MARKER).exists() {
            return Some(dir.to_path_buf());
        }
        candidate = dir.parent();
    }
    None
}

/// Well-known paths derived from the fabric root.
#[derive(Debug, Clone)]
pub struct Paths {
    pub root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve from env/marker discovery.
    pub fn discover() -> Self {
        Self::new(find_root())
    }

    /// SSOT database (override via `HFO_SSOT_DB`).
    pub fn ssot_db(&self) -> PathBuf {
        crate::env::ssot_db_override().unwrap_or_else(|| self.root.join("ssot/hfo_ssot.sqlite"))
    }

    pub fn spell_state(&self) -> PathBuf {
        self.root.join(".spell_gate_state.json")
    }

    pub fn spell_lock(&self) -> PathBuf {
        self.root.join(".spell_gate.lock")
    }

    pub fn anchor_state(&self) -> PathBuf {
        self.root.join(".dimensional_anchor_state.json")
    }

    pub fn wish_state(&self) -> PathBuf {
        self.root.join(".wish_pipelines.json")
    }

    pub fn prospector_state(&self) -> PathBuf {
        self.root.join(".song_prospector_state.json")
    }

    pub fn daemon_logs_dir(&self) -> PathBuf {
        self.root.join(".daemon_logs")
    }

    pub fn daemon_log(&self, key: &str) -> PathBuf {
        self.daemon_logs_dir().join(format!("{key}.log"))
    }

    /// Governance files tracked by the dimensional anchor.
    pub fn governance_files(&self) -> Vec<PathBuf> {
        vec![self.root.join(ROOT_MARKER)]
    }
}

#[cfg(test)]
#[path = "rootfind_tests.rs"]
mod tests;
