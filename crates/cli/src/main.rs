// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hfo: the daemon fabric CLI.
//!
//! Exit codes: 0 success, 1 domain failure (violation, drift, denied
//! wish, preflight fail), 2 usage error.

mod cli;
mod commands;
mod exit_error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    if let Err(err) = commands::dispatch(cli).await {
        if !err.message.is_empty() {
            eprintln!("{err}");
        }
        std::process::exit(err.code);
    }
}
