// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! L4 — power to change structure. Two-phase: a proposal is published
//! immediately, enacted only after its cooldown elapses. Enactment
//! delegates the actual change to the spell gate.

use super::rules::{RuleOutcome, RuleStatus};
use async_trait::async_trait;
use hfo_core::envelope::random_hex16;
use hfo_core::{Clock, Component, EventType};
use hfo_store::{Publisher, Ssot};
use hfo_supervisor::Gate;
use hfo_worker::WorkerError;
use serde::Serialize;
use serde_json::json;
use tracing::info;

const EVT_PROPOSAL: EventType = EventType::new(Component::Meadows, "l4.structure_proposal");
const EVT_ENACTED: EventType = EventType::new(Component::Meadows, "l4.structure_enacted");
const EVT_TOPOLOGY: EventType = EventType::new(Component::Meadows, "l4.topology_changed");

const DEFAULT_COOLDOWN_S: u64 = 600;
const EMBEDDING_COVERAGE_TARGET: f64 = 0.9;

/// Structural change kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalAction {
    EnableDaemon,
    DisableDaemon,
    AdjustPriority,
    Rebalance,
}

/// A proposed change to fabric topology.
#[derive(Debug, Clone, Serialize)]
pub struct StructuralProposal {
    pub id: String,
    pub action: ProposalAction,
    pub target: String,
    pub reason: String,
    pub evidence_event_ids: Vec<i64>,
    pub proposed_at_epoch_s: u64,
    pub cooldown_s: u64,
    pub enacted: bool,
}

/// Where enacted proposals land. The gate implements the real thing;
/// dry runs and tests use the no-op.
#[async_trait]
pub trait EnactmentHooks: Send {
    async fn enact(&mut self, action: ProposalAction, target: &str) -> Result<String, WorkerError>;
}

/// Records nothing, changes nothing.
pub struct NoopHooks;

#[async_trait]
impl EnactmentHooks for NoopHooks {
    async fn enact(
        &mut self,
        _action: ProposalAction,
        _target: &str,
    ) -> Result<String, WorkerError> {
        Ok("noop".to_string())
    }
}

/// Delegates daemon enable/disable to the spell gate's public powers.
pub struct SpellGateHooks {
    gate: Gate,
}

impl SpellGateHooks {
    pub fn new(gate: Gate) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl EnactmentHooks for SpellGateHooks {
    async fn enact(&mut self, action: ProposalAction, target: &str) -> Result<String, WorkerError> {
        match action {
            ProposalAction::EnableDaemon => {
                let receipt = self
                    .gate
                    .summon(target, &[], false, false)
                    .await
                    .map_err(|e| WorkerError::internal(e.to_string()))?;
                Ok(format!("{:?}", receipt.status))
            }
            ProposalAction::DisableDaemon => {
                let receipt = self
                    .gate
                    .banish(target, false)
                    .map_err(|e| WorkerError::internal(e.to_string()))?;
                Ok(format!("{:?}", receipt.status))
            }
            // Priority and rebalance changes are recorded on the trail;
            // operators act on them.
            ProposalAction::AdjustPriority | ProposalAction::Rebalance => Ok("recorded".into()),
        }
    }
}

/// The L4 engine.
pub struct StructureEngine<C: Clock> {
    clock: C,
    proposals: Vec<StructuralProposal>,
    enacted_count: u64,
}

impl<C: Clock> StructureEngine<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            proposals: Vec::new(),
            enacted_count: 0,
        }
    }

    pub fn proposals(&self) -> &[StructuralProposal] {
        &self.proposals
    }

    /// Propose structural changes from observed L5 state.
    pub fn evaluate_topology(
        &mut self,
        ssot: &Ssot,
        publisher: &Publisher,
        l5_results: &[RuleOutcome],
        dry_run: bool,
    ) -> Result<Vec<StructuralProposal>, WorkerError> {
        let mut new_proposals = Vec::new();

        // Model-memory breach -> rebalance loaded models.
        if !self.has_pending(ProposalAction::Rebalance, "gpu_models")
            && l5_results
                .iter()
                .any(|r| r.id == "L5-R02" && r.status == RuleStatus::Violated)
        {
            new_proposals.push(self.propose(
                ProposalAction::Rebalance,
                "gpu_models",
                "model-memory budget breached; swap a large model for a smaller variant",
            ));
        }

        // Event budget nearing its BLOCK limit -> slow every daemon down.
        if let Some(rate) = l5_results.iter().find(|r| r.id == "L5-R01") {
            if rate.status != RuleStatus::Violated
                && rate.value > 60
                && !self.has_pending(ProposalAction::AdjustPriority, "all_daemons")
            {
                new_proposals.push(self.propose(
                    ProposalAction::AdjustPriority,
                    "all_daemons",
                    "event budget past 60%; increase daemon intervals",
                ));
            }
        }

        // Embeddings incomplete and the kraken silent -> wake it.
        let doc_count = ssot.doc_count()?;
        if doc_count > 0 {
            let embedded = ssot.embedding_count()?;
            let coverage = embedded as f64 / doc_count as f64;
            let kraken_active = ssot.count_by_pattern("%kraken%", 60)?;
            if coverage < EMBEDDING_COVERAGE_TARGET
                && kraken_active == 0
                && !self.has_pending(ProposalAction::EnableDaemon, "kraken")
            {
                new_proposals.push(self.propose(
                    ProposalAction::EnableDaemon,
                    "kraken",
                    "embedding coverage incomplete and the kraken is silent",
                ));
            }
        }

        for proposal in &new_proposals {
            if !dry_run {
                publisher.publish(
                    ssot,
                    &EVT_PROPOSAL,
                    &format!("L4:proposal:{:?}", proposal.action),
                    json!({
                        "proposal_id": proposal.id,
                        "action": proposal.action,
                        "target": proposal.target,
                        "reason": proposal.reason,
                        "evidence_event_ids": proposal.evidence_event_ids,
                        "proposed_at_epoch_s": proposal.proposed_at_epoch_s,
                        "cooldown_s": proposal.cooldown_s,
                        "meadows_level": 4,
                    }),
                )?;
            }
            self.proposals.push(proposal.clone());
        }
        Ok(new_proposals)
    }

    /// Enact proposals whose cooldown has elapsed. Returns the newly
    /// enacted set; the caller delegates their actions.
    pub fn enact_mature(
        &mut self,
        ssot: &Ssot,
        publisher: &Publisher,
        dry_run: bool,
    ) -> Result<Vec<StructuralProposal>, WorkerError> {
        let now = self.clock.epoch_s();
        let mut enacted = Vec::new();

        for proposal in &mut self.proposals {
            if proposal.enacted {
                continue;
            }
            if now.saturating_sub(proposal.proposed_at_epoch_s) < proposal.cooldown_s {
                continue;
            }
            proposal.enacted = true;
            self.enacted_count += 1;
            if !dry_run {
                publisher.publish(
                    ssot,
                    &EVT_ENACTED,
                    &format!("L4:enacted:{:?}", proposal.action),
                    json!({
                        "proposal_id": proposal.id,
                        "action": proposal.action,
                        "target": proposal.target,
                        "reason": proposal.reason,
                        "proposed_at_epoch_s": proposal.proposed_at_epoch_s,
                        "enacted_at_epoch_s": now,
                        "cooldown_s": proposal.cooldown_s,
                        "enacted_count_total": self.enacted_count,
                        "meadows_level": 4,
                    }),
                )?;
            }
            info!(proposal = %proposal.id, target = %proposal.target, "enacting");
            enacted.push(proposal.clone());
        }
        Ok(enacted)
    }

    /// Record the current topology as an event.
    pub fn write_topology_snapshot(
        &self,
        ssot: &Ssot,
        publisher: &Publisher,
        active_daemons: &[String],
    ) -> Result<(), WorkerError> {
        publisher.publish(
            ssot,
            &EVT_TOPOLOGY,
            "L4:topology_snapshot",
            json!({
                "active_daemons": active_daemons,
                "active_daemon_count": active_daemons.len(),
                "total_proposals": self.proposals.len(),
                "total_enacted": self.enacted_count,
                "meadows_level": 4,
            }),
        )?;
        Ok(())
    }

    /// A matching proposal is already awaiting its cooldown.
    fn has_pending(&self, action: ProposalAction, target: &str) -> bool {
        self.proposals
            .iter()
            .any(|p| !p.enacted && p.action == action && p.target == target)
    }

    fn propose(
        &self,
        action: ProposalAction,
        target: &str,
        reason: &str,
    ) -> StructuralProposal {
        StructuralProposal {
            id: random_hex16(),
            action,
            target: target.to_string(),
            reason: reason.to_string(),
            evidence_event_ids: Vec::new(),
            proposed_at_epoch_s: self.clock.epoch_s(),
            cooldown_s: DEFAULT_COOLDOWN_S,
            enacted: false,
        }
    }
}

#[cfg(test)]
#[path = "structure_tests.rs"]
mod tests;
