// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon registry: every spawnable worker and its runtime contract.
//! Populated once at startup, read-only afterward. Registry membership is
//! what the gate may summon; unknown keys are refused.

use hfo_core::{DaemonSpec, ModelNeed, Port};
use indexmap::IndexMap;
use std::path::PathBuf;

/// Registration-ordered daemon catalog.
#[derive(Debug, Default)]
pub struct Registry {
    specs: IndexMap<String, DaemonSpec>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spec. Later registrations replace earlier ones.
    pub fn register(&mut self, spec: DaemonSpec) {
        self.specs.insert(spec.key.clone(), spec);
    }

    pub fn get(&self, key: &str) -> Option<&DaemonSpec> {
        self.specs.get(key)
    }

    pub fn all(&self) -> impl Iterator<Item = &DaemonSpec> {
        self.specs.values()
    }

    /// Watchdog targets.
    pub fn persistent(&self) -> impl Iterator<Item = &DaemonSpec> {
        self.specs.values().filter(|s| s.is_persistent)
    }

    pub fn keys(&self) -> Vec<String> {
        self.specs.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// The built-in fleet. Every entry spawns this binary with a daemon
/// subcommand, so preflight can introspect the runnable without
/// executing it.
pub fn builtin_registry() -> Registry {
    let program = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("hfo"));
    let mut registry = Registry::new();

    registry.register(DaemonSpec {
        key: "watcher".into(),
        display_name: "Lidless Watcher".into(),
        port: Port::P0,
        commander: "Lidless Legion".into(),
        program: program.clone(),
        default_args: args(&["watcher", "--interval", "120"]),
        model_need: ModelNeed::None,
        required_model: None,
        min_memory_gb: 0.0,
        cycle_interval_s: 120.0,
        priority: 3,
        spell_cast: "TREMORSENSE".into(),
        is_persistent: true,
    });

    registry.register(DaemonSpec {
        key: "singer".into(),
        display_name: "Singer of Strife and Splendor".into(),
        port: Port::P4,
        commander: "Red Regnant".into(),
        program: program.clone(),
        default_args: args(&["singer", "--interval", "120"]),
        model_need: ModelNeed::Expensive,
        required_model: Some(hfo_core::env::generate_model()),
        min_memory_gb: 8.0,
        cycle_interval_s: 120.0,
        priority: 2,
        spell_cast: "SONGS_OF_STRIFE_AND_SPLENDOR".into(),
        is_persistent: true,
    });

    registry.register(DaemonSpec {
        key: "meadows".into(),
        display_name: "Meadows Engine".into(),
        port: Port::P7,
        commander: "Spider Sovereign".into(),
        program: program.clone(),
        default_args: args(&["governance", "--interval", "300"]),
        model_need: ModelNeed::None,
        required_model: None,
        min_memory_gb: 0.0,
        cycle_interval_s: 300.0,
        priority: 5,
        spell_cast: "MEADOWS_SELF_SPIN".into(),
        is_persistent: true,
    });

    registry.register(DaemonSpec {
        key: "prospector".into(),
        display_name: "Song Prospector".into(),
        port: Port::P4,
        commander: "Red Regnant".into(),
        program: program.clone(),
        default_args: args(&["prospector", "--interval", "300"]),
        model_need: ModelNeed::Expensive,
        required_model: Some(hfo_core::env::generate_model()),
        min_memory_gb: 4.0,
        cycle_interval_s: 300.0,
        priority: 4,
        spell_cast: "SONGS_YET_UNSUNG".into(),
        is_persistent: true,
    });

    registry.register(DaemonSpec {
        key: "kraken".into(),
        display_name: "Devourer of Depths and Dreams".into(),
        port: Port::P6,
        commander: "Kraken Keeper".into(),
        program: program.clone(),
        default_args: args(&["kraken", "--interval", "60"]),
        model_need: ModelNeed::Both,
        required_model: None,
        min_memory_gb: 7.0,
        cycle_interval_s: 60.0,
        priority: 2,
        spell_cast: "CLONE".into(),
        is_persistent: true,
    });

    registry.register(DaemonSpec {
        key: "queue".into(),
        display_name: "Compute Queue".into(),
        port: Port::P7,
        commander: "Spider Sovereign".into(),
        program: program.clone(),
        default_args: args(&["queue", "embed-all"]),
        model_need: ModelNeed::Cheap,
        required_model: None,
        min_memory_gb: 1.0,
        cycle_interval_s: 30.0,
        priority: 5,
        spell_cast: "UNSEEN_CRAFTER".into(),
        is_persistent: true,
    });

    // One-shot probe; the watchdog leaves it alone.
    registry.register(DaemonSpec {
        key: "tremorsense".into(),
        display_name: "Spider Tremorsense".into(),
        port: Port::P7,
        commander: "Spider Sovereign".into(),
        program,
        default_args: args(&["anchor", "probe", "--json"]),
        model_need: ModelNeed::None,
        required_model: None,
        min_memory_gb: 0.0,
        cycle_interval_s: 0.0,
        priority: 3,
        spell_cast: "TREMORSENSE".into(),
        is_persistent: false,
    });

    registry
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
