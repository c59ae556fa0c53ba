// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy carried as enum tags within error events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag attached to every error event on the stigmergy trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultKind {
    /// A check before an operation failed.
    PreflightFailed,
    /// External dependency could not be contacted.
    Unreachable,
    /// External provider refused credentials.
    AuthFailed,
    /// External provider refused due to rate limiting.
    RateLimited,
    /// Model output could not be coerced into the expected schema.
    ParseFailed,
    /// Internal data failed an invariant.
    ValidationFailed,
    /// Persisted state file's integrity hash disagrees with its content.
    Tampered,
    /// A supervised child process is no longer alive.
    Dead,
    /// Uncaught failure inside a worker cycle.
    Internal,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            FaultKind::PreflightFailed => "PREFLIGHT_FAILED",
            FaultKind::Unreachable => "UNREACHABLE",
            FaultKind::AuthFailed => "AUTH_FAILED",
            FaultKind::RateLimited => "RATE_LIMITED",
            FaultKind::ParseFailed => "PARSE_FAILED",
            FaultKind::ValidationFailed => "VALIDATION_FAILED",
            FaultKind::Tampered => "TAMPERED",
            FaultKind::Dead => "DEAD",
            FaultKind::Internal => "INTERNAL",
        };
        write!(f, "{tag}")
    }
}

#[cfg(test)]
#[path = "fault_tests.rs"]
mod tests;
