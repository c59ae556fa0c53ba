// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use hfo_core::FaultKind;
use thiserror::Error;

/// Provider call failures, mapped onto the fault taxonomy.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    #[error("provider call timed out after {0} ms")]
    Timeout(u64),

    #[error("provider refused credentials (HTTP {0})")]
    AuthFailed(u16),

    #[error("provider rate limited the call")]
    RateLimited,

    #[error("provider returned HTTP {0}")]
    Http(u16),

    #[error("provider response could not be parsed: {0}")]
    Parse(String),

    #[error("no credentials configured for provider")]
    NoCredentials,

    #[error("http client construction failed: {0}")]
    Client(#[from] reqwest::Error),
}

impl ModelError {
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            ModelError::Unreachable(_) | ModelError::Timeout(_) | ModelError::Http(_) => {
                FaultKind::Unreachable
            }
            ModelError::AuthFailed(_) | ModelError::NoCredentials => FaultKind::AuthFailed,
            ModelError::RateLimited => FaultKind::RateLimited,
            ModelError::Parse(_) => FaultKind::ParseFailed,
            ModelError::Client(_) => FaultKind::Internal,
        }
    }

    /// Classify a transport/HTTP failure from reqwest.
    pub(crate) fn from_reqwest(err: reqwest::Error, deadline_ms: u64) -> Self {
        if err.is_timeout() {
            return ModelError::Timeout(deadline_ms);
        }
        if err.is_connect() {
            return ModelError::Unreachable(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16());
        }
        ModelError::Unreachable(err.to_string())
    }

    pub(crate) fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ModelError::AuthFailed(status),
            429 => ModelError::RateLimited,
            other => ModelError::Http(other),
        }
    }
}
