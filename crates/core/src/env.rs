// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! Unset toggles default to enabled; the literal values `false`, `0`,
//! and `no` (any case) disable.

use std::path::PathBuf;

/// Generation tag participating in event-type strings (`gen90`).
pub fn generation() -> String {
    std::env::var("HFO_GENERATION").unwrap_or_else(|_| "90".to_string())
}

/// Master daemon toggle.
pub fn daemons_enabled() -> bool {
    truthy(&std::env::var("HFO_DAEMONS_ENABLED").unwrap_or_default())
}

/// Per-daemon toggle: `HFO_DAEMON_<KEY>_ENABLED`.
pub fn daemon_enabled(key: &str) -> bool {
    let var = format!("HFO_DAEMON_{}_ENABLED", key.to_uppercase());
    truthy(&std::env::var(var).unwrap_or_default())
}

/// Name of the per-daemon toggle variable, for preflight detail lines.
pub fn daemon_flag_name(key: &str) -> String {
    format!("HFO_DAEMON_{}_ENABLED", key.to_uppercase())
}

/// Base URL of the primary (local, Ollama-compatible) model provider.
pub fn primary_base_url() -> String {
    std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://127.0.0.1:11434".to_string())
}

/// Base URL of the secondary (hosted) provider, when configured.
pub fn secondary_base_url() -> Option<String> {
    std::env::var("HFO_SECONDARY_BASE_URL")
        .ok()
        .filter(|s| !s.is_empty())
}

/// API key for the secondary provider.
pub fn secondary_api_key() -> Option<String> {
    std::env::var("HFO_SECONDARY_API_KEY")
        .ok()
        .filter(|s| !s.is_empty())
}

/// Embedding model id for the cheap lane.
pub fn embed_model() -> String {
    std::env::var("HFO_EMBED_MODEL").unwrap_or_else(|_| "nomic-embed-text".to_string())
}

/// Generation model id for the expensive lane.
pub fn generate_model() -> String {
    std::env::var("HFO_GENERATE_MODEL").unwrap_or_else(|_| "qwen2.5:7b".to_string())
}

/// Model-memory budget in GB used by probe free-space estimates.
pub fn vram_budget_gb() -> f64 {
    std::env::var("HFO_VRAM_BUDGET_GB")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8.0)
}

/// Explicit SSOT database path override.
pub fn ssot_db_override() -> Option<PathBuf> {
    std::env::var("HFO_SSOT_DB").ok().map(PathBuf::from)
}

/// Unset is truthy; `false`/`0`/`no` (any case) are falsy.
pub fn truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no"
    )
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
