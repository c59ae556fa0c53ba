// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Probe report shapes and verdict domains.

use hfo_model::LoadedModel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RamVerdict {
    Ok,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GpuVerdict {
    Ok,
    Warning,
    Critical,
    Hot,
    NoGpu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NpuVerdict {
    Active,
    Idle,
    NoRuntime,
    NoDevice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AiVerdict {
    Ok,
    Slow,
    AuthFailed,
    RateLimited,
    Unreachable,
    NoCredentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Healthy,
    Warning,
    Critical,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct RamReport {
    pub verdict: RamVerdict,
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub percent: f64,
    pub swap_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GpuReport {
    pub verdict: GpuVerdict,
    pub vram_used_gb: f64,
    pub vram_free_gb: f64,
    pub loaded_models: Vec<LoadedModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NpuReport {
    pub verdict: NpuVerdict,
    pub runtime_installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    pub devices: Vec<String>,
    pub worker_running: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AiReport {
    pub verdict: AiVerdict,
    /// "primary" | "secondary" when a provider answered.
    pub mode: Option<String>,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemReport {
    pub cpu_percent: f64,
    pub cpu_cores: usize,
    pub disk_free_gb: f64,
    pub disk_percent: f64,
    pub process_count: usize,
    pub platform: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SsotReport {
    pub doc_count: i64,
    pub event_count: i64,
    pub fts_ok: bool,
}

/// The full probe report (§ resource probe contract).
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub status: OverallStatus,
    pub ram: RamReport,
    pub gpu: GpuReport,
    pub npu: NpuReport,
    pub ai: AiReport,
    pub system: SystemReport,
    pub ssot: SsotReport,
}

impl ProbeReport {
    /// Aggregate status from the dimension verdicts.
    pub fn aggregate_status(
        ram: RamVerdict,
        gpu: GpuVerdict,
        ai: AiVerdict,
    ) -> OverallStatus {
        if ram == RamVerdict::Critical || matches!(gpu, GpuVerdict::Critical | GpuVerdict::Hot) {
            return OverallStatus::Critical;
        }
        if matches!(ai, AiVerdict::Unreachable | AiVerdict::NoCredentials) {
            return OverallStatus::Fallback;
        }
        if ram == RamVerdict::Warning
            || gpu == GpuVerdict::Warning
            || matches!(ai, AiVerdict::Slow | AiVerdict::RateLimited | AiVerdict::AuthFailed)
        {
            return OverallStatus::Warning;
        }
        OverallStatus::Healthy
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
