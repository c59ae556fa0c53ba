// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type carrying a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly; `main()` owns process termination.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Domain failure: violation, drift, denied wish, preflight fail.
    pub fn domain(message: impl Into<String>) -> Self {
        Self::new(1, message)
    }

    /// Success path that still needs to short-circuit.
    pub fn silent(code: i32) -> Self {
        Self::new(code, String::new())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<hfo_supervisor::GateError> for ExitError {
    fn from(err: hfo_supervisor::GateError) -> Self {
        ExitError::domain(err.to_string())
    }
}

impl From<hfo_store::StoreError> for ExitError {
    fn from(err: hfo_store::StoreError) -> Self {
        ExitError::domain(err.to_string())
    }
}

impl From<hfo_anchor::AnchorError> for ExitError {
    fn from(err: hfo_anchor::AnchorError) -> Self {
        ExitError::domain(err.to_string())
    }
}

impl From<hfo_wish::WishError> for ExitError {
    fn from(err: hfo_wish::WishError) -> Self {
        ExitError::domain(err.to_string())
    }
}

impl From<hfo_worker::WorkerError> for ExitError {
    fn from(err: hfo_worker::WorkerError) -> Self {
        ExitError::domain(err.to_string())
    }
}

impl From<hfo_model::ModelError> for ExitError {
    fn from(err: hfo_model::ModelError) -> Self {
        ExitError::domain(err.to_string())
    }
}
