// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations.

mod anchor;
mod daemons;
mod queue;
mod supervisor;
mod wish;

use crate::cli::{Cli, Command};
use crate::exit_error::ExitError;
use hfo_core::{Component, Paths};
use hfo_store::{Publisher, Ssot};
use hfo_worker::WorkerContext;

/// Route a parsed invocation to its handler.
pub async fn dispatch(cli: Cli) -> Result<(), ExitError> {
    let json = cli.json;
    match cli.command {
        Command::Summon {
            daemon_key,
            force,
            dry_run,
            extra_args,
        } => supervisor::summon(&daemon_key, force, dry_run, extra_args, json).await,
        Command::Banish { daemon_key, dry_run } => {
            supervisor::banish(&daemon_key, dry_run, json)
        }
        Command::Scrying { daemon_key } => supervisor::scrying(daemon_key.as_deref(), json),
        Command::Sending => supervisor::sending(json),
        Command::Watchdog { auto_resurrect } => supervisor::watchdog(auto_resurrect, json).await,
        Command::List => supervisor::list(json),
        Command::Anchor { verb } => anchor::handle(verb, json).await,
        Command::Watcher(run) => daemons::watcher(run).await,
        Command::Governance {
            evaluate,
            status,
            validate,
            dry_run,
            interval,
        } => daemons::governance(evaluate, status, validate, dry_run, interval, json).await,
        Command::Singer { run, health } => daemons::singer(run, health, json).await,
        Command::Prospector {
            once,
            dry_run,
            batch_size,
            interval,
            status,
        } => daemons::prospector(once, dry_run, batch_size, interval, status, json).await,
        Command::Kraken { run, status } => daemons::kraken(run, status, json).await,
        Command::Queue { verb } => queue::handle(verb, json).await,
        Command::Wish { verb } => wish::handle(verb, json).await,
    }
}

/// Root paths for this invocation.
pub(crate) fn fabric_paths() -> Paths {
    Paths::discover()
}

/// Open the SSOT at the fabric root.
pub(crate) fn open_ssot(paths: &Paths) -> Result<Ssot, ExitError> {
    Ok(Ssot::open(paths.ssot_db())?)
}

/// Standard worker context with Ctrl-C wired to cancellation.
pub(crate) fn worker_context(
    component: Component,
    dry_run: bool,
) -> Result<WorkerContext, ExitError> {
    let paths = fabric_paths();
    let ssot = open_ssot(&paths)?;
    let generation = hfo_core::env::generation();
    let publisher = Publisher::for_component(component, &generation);
    let cx = WorkerContext::new(paths, ssot, publisher, dry_run)?;

    let cancel = cx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });
    Ok(cx)
}
