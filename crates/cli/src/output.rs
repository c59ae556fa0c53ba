// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output helpers: JSON on demand, terse lines otherwise.

use crate::exit_error::ExitError;
use serde::Serialize;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), ExitError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ExitError::new(1, format!("serialization failed: {e}")))?;
    println!("{json}");
    Ok(())
}

/// JSON when requested, otherwise one human line.
pub fn emit<T: Serialize>(json: bool, value: &T, line: &str) -> Result<(), ExitError> {
    if json {
        print_json(value)
    } else {
        println!("{line}");
        Ok(())
    }
}
