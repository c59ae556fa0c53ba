// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The probe itself: one invocation, six dimensions, soft timeouts.

use crate::report::*;
use hfo_model::{ModelError, PrimaryClient, SecondaryClient};
use hfo_store::Ssot;
use std::time::Duration;
use sysinfo::{Disks, System};
use tokio::time::timeout;
use tracing::debug;

const DIMENSION_TIMEOUT: Duration = Duration::from_secs(5);

/// External collaborators the probe consults.
pub struct ProbeDeps<'a> {
    pub primary: &'a PrimaryClient,
    pub secondary: Option<&'a SecondaryClient>,
    pub ssot: Option<&'a Ssot>,
}

/// Capture a point-in-time report across every dimension.
pub async fn probe(deps: &ProbeDeps<'_>) -> ProbeReport {
    let (ram, system) = probe_host();
    let gpu = match timeout(DIMENSION_TIMEOUT, probe_gpu(deps.primary)).await {
        Ok(report) => report,
        Err(_) => gpu_failed(),
    };
    let npu = match timeout(DIMENSION_TIMEOUT, probe_npu(deps.primary)).await {
        Ok(report) => report,
        Err(_) => npu_failed(),
    };
    let ai = match timeout(DIMENSION_TIMEOUT * 2, probe_ai(deps.primary, deps.secondary)).await {
        Ok(report) => report,
        Err(_) => ai_failed(),
    };
    let ssot = probe_ssot(deps.ssot);

    let status = ProbeReport::aggregate_status(ram.verdict, gpu.verdict, ai.verdict);
    debug!(?status, "probe complete");
    ProbeReport {
        status,
        ram,
        gpu,
        npu,
        ai,
        system,
        ssot,
    }
}

/// RAM + system dimensions from one sysinfo refresh.
fn probe_host() -> (RamReport, SystemReport) {
    let mut sys = System::new_all();
    sys.refresh_all();
    // CPU usage needs a second sample after a short interval.
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu();

    let total = sys.total_memory() as f64 / 1e9;
    let used = sys.used_memory() as f64 / 1e9;
    let free = (total - used).max(0.0);
    let percent = if total > 0.0 { used / total * 100.0 } else { 0.0 };
    let swap_total = sys.total_swap() as f64;
    let swap_percent = if swap_total > 0.0 {
        sys.used_swap() as f64 / swap_total * 100.0
    } else {
        0.0
    };
    let ram_verdict = if percent > 92.0 || free < 1.0 {
        RamVerdict::Critical
    } else if percent > 80.0 || free < 3.0 {
        RamVerdict::Warning
    } else {
        RamVerdict::Ok
    };

    let disks = Disks::new_with_refreshed_list();
    let (disk_free_gb, disk_percent) = disks
        .list()
        .first()
        .map(|d| {
            let total = d.total_space() as f64;
            let free = d.available_space() as f64;
            let used_pct = if total > 0.0 {
                (total - free) / total * 100.0
            } else {
                0.0
            };
            (free / 1e9, used_pct)
        })
        .unwrap_or((0.0, 0.0));

    let ram = RamReport {
        verdict: ram_verdict,
        total_gb: round1(total),
        used_gb: round1(used),
        free_gb: round1(free),
        percent: round1(percent),
        swap_percent: round1(swap_percent),
    };
    let system = SystemReport {
        cpu_percent: round1(sys.global_cpu_info().cpu_usage() as f64),
        cpu_cores: sys.cpus().len(),
        disk_free_gb: round1(disk_free_gb),
        disk_percent: round1(disk_percent),
        process_count: sys.processes().len(),
        platform: std::env::consts::OS.to_string(),
    };
    (ram, system)
}

/// Expensive-compute dimension via the primary provider's loaded models.
async fn probe_gpu(primary: &PrimaryClient) -> GpuReport {
    match primary.ps().await {
        Ok(loaded) => {
            let used: f64 = loaded.iter().map(|m| m.vram_gb).sum();
            let budget = hfo_core::env::vram_budget_gb();
            let free = (budget - used).max(0.0);
            let verdict = if used > budget {
                GpuVerdict::Critical
            } else if used > budget * 0.85 {
                GpuVerdict::Warning
            } else {
                GpuVerdict::Ok
            };
            GpuReport {
                verdict,
                vram_used_gb: round1(used),
                vram_free_gb: round1(free),
                loaded_models: loaded,
                temp_c: None,
                driver: None,
            }
        }
        Err(ModelError::Unreachable(_)) | Err(ModelError::Timeout(_)) => GpuReport {
            verdict: GpuVerdict::NoGpu,
            vram_used_gb: 0.0,
            vram_free_gb: 0.0,
            loaded_models: vec![],
            temp_c: None,
            driver: None,
        },
        Err(_) => gpu_failed(),
    }
}

fn gpu_failed() -> GpuReport {
    GpuReport {
        verdict: GpuVerdict::Critical,
        vram_used_gb: 0.0,
        vram_free_gb: 0.0,
        loaded_models: vec![],
        temp_c: None,
        driver: None,
    }
}

/// Cheap-compute dimension: does the embeddings route answer, and is an
/// embedder-capable model installed?
async fn probe_npu(primary: &PrimaryClient) -> NpuReport {
    match primary.tags().await {
        Ok(tags) => {
            let embed_model = hfo_core::env::embed_model();
            let devices: Vec<String> = tags
                .iter()
                .filter(|name| name.contains("embed"))
                .cloned()
                .collect();
            let worker_running = tags.iter().any(|name| name.contains(&embed_model));
            let verdict = if devices.is_empty() {
                NpuVerdict::NoDevice
            } else if worker_running {
                NpuVerdict::Active
            } else {
                NpuVerdict::Idle
            };
            NpuReport {
                verdict,
                runtime_installed: true,
                runtime_version: None,
                devices,
                worker_running,
            }
        }
        Err(_) => npu_failed(),
    }
}

fn npu_failed() -> NpuReport {
    NpuReport {
        verdict: NpuVerdict::NoRuntime,
        runtime_installed: false,
        runtime_version: None,
        devices: vec![],
        worker_running: false,
    }
}

/// External-AI dimension: primary first, secondary as fallback.
async fn probe_ai(primary: &PrimaryClient, secondary: Option<&SecondaryClient>) -> AiReport {
    let started = std::time::Instant::now();
    if primary.is_alive().await {
        let latency = started.elapsed().as_secs_f64() * 1000.0;
        let verdict = if latency > 2_000.0 { AiVerdict::Slow } else { AiVerdict::Ok };
        return AiReport {
            verdict,
            mode: Some("primary".into()),
            reachable: true,
            latency_ms: Some(round1(latency)),
        };
    }
    match secondary {
        Some(client) => match client.ping().await {
            Ok(latency) => AiReport {
                verdict: if latency > 2_000.0 { AiVerdict::Slow } else { AiVerdict::Ok },
                mode: Some("secondary".into()),
                reachable: true,
                latency_ms: Some(round1(latency)),
            },
            Err(ModelError::AuthFailed(_)) => AiReport {
                verdict: AiVerdict::AuthFailed,
                mode: Some("secondary".into()),
                reachable: true,
                latency_ms: None,
            },
            Err(ModelError::RateLimited) => AiReport {
                verdict: AiVerdict::RateLimited,
                mode: Some("secondary".into()),
                reachable: true,
                latency_ms: None,
            },
            Err(_) => ai_failed(),
        },
        None => AiReport {
            verdict: AiVerdict::NoCredentials,
            mode: None,
            reachable: false,
            latency_ms: None,
        },
    }
}

fn ai_failed() -> AiReport {
    AiReport {
        verdict: AiVerdict::Unreachable,
        mode: None,
        reachable: false,
        latency_ms: None,
    }
}

/// Store dimension; informational, degrades to zeros when absent.
fn probe_ssot(ssot: Option<&Ssot>) -> SsotReport {
    match ssot.map(|s| s.stats()) {
        Some(Ok(stats)) => SsotReport {
            doc_count: stats.doc_count,
            event_count: stats.event_count,
            fts_ok: stats.fts_ok,
        },
        _ => SsotReport {
            doc_count: 0,
            event_count: 0,
            fts_ok: false,
        },
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
