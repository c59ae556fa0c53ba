// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dimensional anchor verbs.

use crate::cli::AnchorVerb;
use crate::exit_error::ExitError;
use crate::output::{emit, print_json};
use hfo_anchor::{Anchor, CheckOutcome};

fn open_anchor() -> Result<Anchor, ExitError> {
    let paths = super::fabric_paths();
    let ssot = super::open_ssot(&paths)?;
    Ok(Anchor::new(paths, ssot)?)
}

pub async fn handle(verb: AnchorVerb, json: bool) -> Result<(), ExitError> {
    let anchor = open_anchor()?;
    match verb {
        AnchorVerb::Probe => {
            let report = anchor.probe().await?;
            emit(json, &report, &format!("probe status: {:?}", report.status))
        }
        AnchorVerb::Anchor => {
            let receipt = anchor.anchor().await?;
            emit(
                json,
                &receipt,
                &format!("anchored; hash {}", &receipt.anchor_hash[..12]),
            )
        }
        AnchorVerb::Check => {
            let outcome = anchor.check().await?;
            match &outcome {
                CheckOutcome::Anchored { check_count } => emit(
                    json,
                    &outcome,
                    &format!("ANCHORED (check {check_count})"),
                ),
                CheckOutcome::DriftDetected {
                    dimensions,
                    drift_count,
                } => {
                    let names: Vec<&str> = dimensions.keys().map(String::as_str).collect();
                    emit(
                        json,
                        &outcome,
                        &format!(
                            "DRIFT_DETECTED in [{}] (drift {drift_count})",
                            names.join(", ")
                        ),
                    )?;
                    Err(ExitError::silent(1))
                }
                CheckOutcome::Tampered => {
                    emit(json, &outcome, "TAMPERED: release and re-anchor")?;
                    Err(ExitError::silent(1))
                }
            }
        }
        AnchorVerb::Status => {
            let receipt = anchor.status();
            if json {
                print_json(&receipt)
            } else {
                println!(
                    "{} set_at={} checks={} drifts={}",
                    receipt.status,
                    receipt.set_at.as_deref().unwrap_or("-"),
                    receipt.check_count,
                    receipt.drift_count,
                );
                Ok(())
            }
        }
        AnchorVerb::Release => {
            let receipt = anchor.release()?;
            emit(
                json,
                &receipt,
                &format!("released; cumulative drift {}", receipt.drift_count),
            )
        }
    }
}
