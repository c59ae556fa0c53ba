// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    healthy = { RamVerdict::Ok, GpuVerdict::Ok, AiVerdict::Ok, OverallStatus::Healthy },
    ram_warn = { RamVerdict::Warning, GpuVerdict::Ok, AiVerdict::Ok, OverallStatus::Warning },
    ram_critical = { RamVerdict::Critical, GpuVerdict::Ok, AiVerdict::Ok, OverallStatus::Critical },
    gpu_hot = { RamVerdict::Ok, GpuVerdict::Hot, AiVerdict::Ok, OverallStatus::Critical },
    ai_down = { RamVerdict::Ok, GpuVerdict::Ok, AiVerdict::Unreachable, OverallStatus::Fallback },
    no_creds = { RamVerdict::Ok, GpuVerdict::NoGpu, AiVerdict::NoCredentials, OverallStatus::Fallback },
    ai_slow = { RamVerdict::Ok, GpuVerdict::Ok, AiVerdict::Slow, OverallStatus::Warning },
    critical_wins = { RamVerdict::Critical, GpuVerdict::Ok, AiVerdict::Unreachable, OverallStatus::Critical },
)]
fn test_aggregate_status(ram: RamVerdict, gpu: GpuVerdict, ai: AiVerdict, expected: OverallStatus) {
    assert_eq!(ProbeReport::aggregate_status(ram, gpu, ai), expected);
}

#[test]
fn test_verdicts_serialize_screaming() {
    assert_eq!(serde_json::to_string(&GpuVerdict::NoGpu).unwrap(), "\"NO_GPU\"");
    assert_eq!(
        serde_json::to_string(&AiVerdict::NoCredentials).unwrap(),
        "\"NO_CREDENTIALS\""
    );
    assert_eq!(
        serde_json::to_string(&NpuVerdict::NoRuntime).unwrap(),
        "\"NO_RUNTIME\""
    );
    assert_eq!(
        serde_json::to_string(&OverallStatus::Fallback).unwrap(),
        "\"FALLBACK\""
    );
}
