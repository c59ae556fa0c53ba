// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The anchor operations: anchor, check, status, release, probe.

use crate::baseline::{capture_baseline, compute_anchor_hash};
use crate::drift::{detect_drift, DriftMap};
use crate::state::AnchorState;
use chrono::{SecondsFormat, Utc};
use hfo_core::{Component, EventType, FaultKind, Paths};
use hfo_model::{PrimaryClient, SecondaryClient};
use hfo_probe::{probe, ProbeDeps, ProbeReport};
use hfo_store::{Publisher, Ssot};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

const EVT_SET: EventType = EventType::new(Component::Anchor, "set");
const EVT_CHECK: EventType = EventType::new(Component::Anchor, "check");
const EVT_DRIFT: EventType = EventType::new(Component::Anchor, "drift");
const EVT_RELEASE: EventType = EventType::new(Component::Anchor, "release");
const EVT_TAMPERED: EventType = EventType::new(Component::Anchor, "tampered");
const EVT_PROBE: EventType = EventType::new(Component::Anchor, "probe");

#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("no active anchor; cast anchor first")]
    NotAnchored,

    #[error("state file error: {0}")]
    State(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] hfo_store::StoreError),
}

/// Receipt for `anchor` and `release`.
#[derive(Debug, Clone, Serialize)]
pub struct AnchorReceipt {
    pub status: String,
    pub anchor_hash: String,
    pub set_at: Option<String>,
    pub check_count: u64,
    pub drift_count: u64,
}

/// Outcome of a drift check.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "verdict", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckOutcome {
    Anchored {
        check_count: u64,
    },
    DriftDetected {
        dimensions: DriftMap,
        drift_count: u64,
    },
    Tampered,
}

/// The dimensional anchor, bound to a root and a store handle.
pub struct Anchor {
    paths: Paths,
    ssot: Ssot,
    publisher: Publisher,
    primary: PrimaryClient,
    secondary: Option<SecondaryClient>,
}

impl Anchor {
    pub fn new(paths: Paths, ssot: Ssot) -> Result<Self, AnchorError> {
        let generation = hfo_core::env::generation();
        let publisher = Publisher::for_component(Component::Anchor, &generation);
        let primary = PrimaryClient::from_env()
            .map_err(|e| AnchorError::State(std::io::Error::other(e.to_string())))?;
        Ok(Self {
            paths,
            ssot,
            publisher,
            primary,
            secondary: SecondaryClient::from_env(),
        })
    }

    fn deps(&self) -> ProbeDeps<'_> {
        ProbeDeps {
            primary: &self.primary,
            secondary: self.secondary.as_ref(),
            ssot: Some(&self.ssot),
        }
    }

    /// Capture and pin a baseline.
    pub async fn anchor(&self) -> Result<AnchorReceipt, AnchorError> {
        let baseline = capture_baseline(&self.paths, &self.deps()).await;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false);

        let state = AnchorState {
            active: true,
            set_at: Some(now.clone()),
            check_count: 0,
            drift_count: 0,
            tampered: false,
            baseline: Some(baseline.clone()),
        };
        state.save(&self.paths.anchor_state())?;

        self.publisher.publish(
            &self.ssot,
            &EVT_SET,
            &format!("ANCHOR_SET:{}", &baseline.anchor_hash[..12]),
            json!({
                "anchor_hash": baseline.anchor_hash,
                "set_at": now,
                "file_count": baseline.file_hashes.len(),
                "fleet_size": baseline.fleet.len(),
                "loaded_models": baseline.loaded_models,
            }),
        )?;
        info!(hash = %baseline.anchor_hash, "anchor set");

        Ok(AnchorReceipt {
            status: "ANCHORED_SET".into(),
            anchor_hash: baseline.anchor_hash,
            set_at: Some(now),
            check_count: 0,
            drift_count: 0,
        })
    }

    /// Re-capture and diff against the pinned baseline.
    pub async fn check(&self) -> Result<CheckOutcome, AnchorError> {
        let mut state = AnchorState::load(&self.paths.anchor_state());
        if !state.active {
            return Err(AnchorError::NotAnchored);
        }
        if state.tampered {
            // Terminal until release + re-anchor.
            return Ok(CheckOutcome::Tampered);
        }
        let Some(baseline) = state.baseline.clone() else {
            return Err(AnchorError::NotAnchored);
        };

        // Integrity first: recompute from the deserialized struct.
        let recomputed = compute_anchor_hash(&baseline);
        if recomputed != baseline.anchor_hash {
            warn!("anchor integrity hash mismatch");
            state.tampered = true;
            state.save(&self.paths.anchor_state())?;
            self.publisher.publish_fault(
                &self.ssot,
                &EVT_TAMPERED,
                "ANCHOR_TAMPERED",
                FaultKind::Tampered,
                "stored anchor hash disagrees with stored baseline",
                json!({
                    "stored_hash": baseline.anchor_hash,
                    "recomputed_hash": recomputed,
                }),
            )?;
            return Ok(CheckOutcome::Tampered);
        }

        let current = capture_baseline(&self.paths, &self.deps()).await;
        let drift = detect_drift(&baseline, &current);

        state.check_count += 1;
        let outcome = if drift.is_empty() {
            self.publisher.publish(
                &self.ssot,
                &EVT_CHECK,
                &format!("ANCHORED:check_{}", state.check_count),
                json!({
                    "verdict": "ANCHORED",
                    "check_count": state.check_count,
                    "anchor_hash": baseline.anchor_hash,
                }),
            )?;
            CheckOutcome::Anchored {
                check_count: state.check_count,
            }
        } else {
            state.drift_count += 1;
            self.publisher.publish(
                &self.ssot,
                &EVT_DRIFT,
                &format!("DRIFT_DETECTED:{}_dimensions", drift.len()),
                json!({
                    "verdict": "DRIFT_DETECTED",
                    "dimensions": drift,
                    "check_count": state.check_count,
                    "drift_count": state.drift_count,
                }),
            )?;
            CheckOutcome::DriftDetected {
                dimensions: drift,
                drift_count: state.drift_count,
            }
        };
        state.save(&self.paths.anchor_state())?;
        Ok(outcome)
    }

    /// Current anchor bookkeeping without re-probing.
    pub fn status(&self) -> AnchorReceipt {
        let state = AnchorState::load(&self.paths.anchor_state());
        AnchorReceipt {
            status: if state.tampered {
                "TAMPERED".into()
            } else if state.active {
                "ACTIVE".into()
            } else {
                "INACTIVE".into()
            },
            anchor_hash: state
                .baseline
                .map(|b| b.anchor_hash)
                .unwrap_or_default(),
            set_at: state.set_at,
            check_count: state.check_count,
            drift_count: state.drift_count,
        }
    }

    /// Deactivate the anchor.
    pub fn release(&self) -> Result<AnchorReceipt, AnchorError> {
        let mut state = AnchorState::load(&self.paths.anchor_state());
        let drift_count = state.drift_count;
        let check_count = state.check_count;
        state.active = false;
        state.tampered = false;
        state.baseline = None;
        state.save(&self.paths.anchor_state())?;

        self.publisher.publish(
            &self.ssot,
            &EVT_RELEASE,
            "ANCHOR_RELEASED",
            json!({
                "check_count": check_count,
                "cumulative_drift_count": drift_count,
            }),
        )?;

        Ok(AnchorReceipt {
            status: "RELEASED".into(),
            anchor_hash: String::new(),
            set_at: None,
            check_count,
            drift_count,
        })
    }

    /// Live probe report without requiring a prior anchor.
    pub async fn probe(&self) -> Result<ProbeReport, AnchorError> {
        let report = probe(&self.deps()).await;
        self.publisher.publish(
            &self.ssot,
            &EVT_PROBE,
            &format!("PROBE:{:?}", report.status),
            serde_json::to_value(&report).unwrap_or_default(),
        )?;
        Ok(report)
    }
}

#[cfg(test)]
#[path = "spells_tests.rs"]
mod tests;
