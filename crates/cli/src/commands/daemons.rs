// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon run-loops: watcher, governance, singer, prospector, kraken.

use crate::cli::LoopArgs;
use crate::exit_error::ExitError;
use crate::output::print_json;
use hfo_core::Component;
use hfo_daemons::meadows::{validate_all, RulesEngine, SpellGateHooks};
use hfo_daemons::{
    KrakenDaemon, MeadowsDaemon, NoopHooks, ProspectorDaemon, SingerDaemon, WatcherDaemon,
};
use hfo_supervisor::{builtin_registry, Gate};
use hfo_worker::{run_loop, RunOptions, Worker};
use std::time::Duration;

fn options(run: &LoopArgs) -> RunOptions {
    RunOptions::new(Duration::from_secs(run.interval))
        .single(run.single)
        .max_cycles(run.max_cycles)
}

async fn drive<W: Worker + Send>(
    worker: &mut W,
    run: &LoopArgs,
) -> Result<(), ExitError> {
    let mut cx = super::worker_context(worker.component(), run.dry_run)?;
    let summary = run_loop(worker, &mut cx, options(run)).await?;
    tracing::info!(cycles = summary.cycles, errors = summary.errors, "loop finished");
    Ok(())
}

pub async fn watcher(run: LoopArgs) -> Result<(), ExitError> {
    drive(&mut WatcherDaemon, &run).await
}

pub async fn singer(run: LoopArgs, health: bool, json: bool) -> Result<(), ExitError> {
    if health {
        let paths = super::fabric_paths();
        let ssot = super::open_ssot(&paths)?;
        let snapshot = ssot.read_last_matching("%p4.singer.health")?;
        return match snapshot {
            Some(event) if json => print_json(&event),
            Some(event) => {
                println!("{}", event.subject);
                println!("{}", event.payload());
                Ok(())
            }
            None => {
                println!("no health snapshot on the trail yet");
                Ok(())
            }
        };
    }
    drive(&mut SingerDaemon::new(), &run).await
}

pub async fn governance(
    evaluate: bool,
    status: bool,
    validate: bool,
    dry_run: bool,
    interval: u64,
    json: bool,
) -> Result<(), ExitError> {
    let paths = super::fabric_paths();

    if status {
        let ssot = super::open_ssot(&paths)?;
        let tick = ssot.read_last_matching("%meadows.engine_tick")?;
        let violations = ssot.count_by_pattern("%l5.rule_violated", 24 * 60)?;
        let proposals = ssot.count_by_pattern("%l4.structure_proposal", 24 * 60)?;
        let enacted = ssot.count_by_pattern("%l4.structure_enacted", 24 * 60)?;
        let summary = serde_json::json!({
            "last_tick": tick.map(|t| t.subject),
            "violations_24h": violations,
            "proposals_24h": proposals,
            "enacted_24h": enacted,
        });
        if json {
            return print_json(&summary);
        }
        println!("violations_24h={violations} proposals_24h={proposals} enacted_24h={enacted}");
        return Ok(());
    }

    if validate {
        let ssot = super::open_ssot(&paths)?;
        let summary = validate_all(&ssot)?;
        if json {
            print_json(&summary)?;
        } else {
            for result in &summary.results {
                println!("{} {:<24} {:?}", result.id, result.name, result.result);
            }
            println!(
                "passed={} failed={} skipped={} errored={}",
                summary.passed, summary.failed, summary.skipped, summary.errored
            );
        }
        if summary.failed > 0 {
            return Err(ExitError::silent(1));
        }
        return Ok(());
    }

    if evaluate {
        let ssot = super::open_ssot(&paths)?;
        let publisher = hfo_store::Publisher::for_component(
            Component::Meadows,
            &hfo_core::env::generation(),
        );
        let mut rules = RulesEngine::new(hfo_core::SystemClock);
        let outcomes = rules.evaluate_all(&ssot, &publisher, dry_run)?;
        let violated = outcomes
            .iter()
            .filter(|o| o.status == hfo_daemons::meadows::RuleStatus::Violated)
            .count();
        if json {
            print_json(&outcomes)?;
        } else {
            for outcome in &outcomes {
                println!(
                    "{} {:<24} {:?} value={}",
                    outcome.id, outcome.name, outcome.status, outcome.value
                );
            }
        }
        if violated > 0 {
            return Err(ExitError::silent(1));
        }
        return Ok(());
    }

    // Full loop. Enactments go through a real spell gate; dry runs stay
    // inert.
    let mut daemon: MeadowsDaemon = if dry_run {
        MeadowsDaemon::new(Box::new(NoopHooks))
    } else {
        let ssot = super::open_ssot(&paths)?;
        let gate = Gate::new(paths.clone(), builtin_registry(), ssot)?;
        MeadowsDaemon::new(Box::new(SpellGateHooks::new(gate)))
    };
    let run = LoopArgs {
        single: false,
        dry_run,
        interval,
        max_cycles: None,
    };
    drive(&mut daemon, &run).await
}

pub async fn prospector(
    once: bool,
    dry_run: bool,
    batch_size: i64,
    interval: u64,
    status: bool,
    json: bool,
) -> Result<(), ExitError> {
    if status {
        let paths = super::fabric_paths();
        let state = hfo_daemons::prospector::ProspectorState::load(&paths);
        if json {
            return print_json(&state);
        }
        println!(
            "considered={} temperature={} saved_at={}",
            state.prospected_ids.len(),
            state.temperature,
            state.saved_at.as_deref().unwrap_or("-"),
        );
        return Ok(());
    }
    let mut daemon = ProspectorDaemon::new().batch_size(batch_size);
    let run = LoopArgs {
        single: once,
        dry_run,
        interval,
        max_cycles: None,
    };
    drive(&mut daemon, &run).await
}

pub async fn kraken(run: LoopArgs, status: bool, json: bool) -> Result<(), ExitError> {
    if status {
        let paths = super::fabric_paths();
        let ssot = super::open_ssot(&paths)?;
        let pulse = ssot.read_last_matching("%kraken.loop.pulse")?;
        let health = ssot.read_last_matching("%kraken.loop.health")?;
        let summary = serde_json::json!({
            "last_pulse": pulse.map(|p| p.data),
            "last_health": health.map(|h| h.data),
            "embedding_count": ssot.embedding_count()?,
            "doc_count": ssot.doc_count()?,
        });
        if json {
            return print_json(&summary);
        }
        println!("{summary}");
        return Ok(());
    }
    drive(&mut KrakenDaemon::new(), &run).await
}
