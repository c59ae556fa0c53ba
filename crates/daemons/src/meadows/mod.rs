// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Meadows engine: governance layered on the stigmergy trail.
//!
//! Three engines per cycle: information-flow subscriptions (L6), rule
//! evaluation with cooldowns and a BLOCK self-throttle (L5), and
//! two-phase structural proposals (L4). Every Nth cycle a fixed set of
//! acceptance criteria validates the engine against live state.

mod rules;
mod sbe;
mod structure;
mod subscriptions;

pub use rules::{Rule, RuleAction, RuleCondition, RuleOutcome, RuleStatus, RulesEngine};
pub use sbe::{validate_all, CriterionResult, SbeResult, SbeSummary};
pub use structure::{
    EnactmentHooks, NoopHooks, ProposalAction, SpellGateHooks, StructuralProposal, StructureEngine,
};
pub use subscriptions::{InfoFlowEngine, Subscription, SubscriptionAction};

use async_trait::async_trait;
use hfo_core::{Clock, Component, EventType, SystemClock};
use hfo_worker::{CycleReport, Worker, WorkerContext, WorkerError};
use serde_json::json;
use std::time::Instant;
use tracing::{info, warn};

const EVT_ENGINE_TICK: EventType = EventType::new(Component::Meadows, "engine_tick");
const EVT_COOLDOWN_ACTIVE: EventType = EventType::new(Component::Meadows, "l5.cooldown_active");
const EVT_SBE_VALIDATION: EventType = EventType::new(Component::Meadows, "sbe_validation");

const SBE_EVERY_N: u64 = 10;

/// The governance daemon.
pub struct MeadowsDaemon<C: Clock = SystemClock> {
    clock: C,
    l6: InfoFlowEngine<C>,
    l5: RulesEngine<C>,
    l4: StructureEngine<C>,
    hooks: Box<dyn EnactmentHooks>,
    cycle: u64,
    throttled_until: Option<Instant>,
    throttle_published: bool,
}

impl MeadowsDaemon<SystemClock> {
    pub fn new(hooks: Box<dyn EnactmentHooks>) -> Self {
        Self::with_clock(SystemClock, hooks)
    }
}

impl<C: Clock> MeadowsDaemon<C> {
    pub fn with_clock(clock: C, hooks: Box<dyn EnactmentHooks>) -> Self {
        Self {
            l6: InfoFlowEngine::new(clock.clone()),
            l5: RulesEngine::new(clock.clone()),
            l4: StructureEngine::new(clock.clone()),
            clock,
            hooks,
            cycle: 0,
            throttled_until: None,
            throttle_published: false,
        }
    }

    /// Swap the rules engine (tests inject tight rules).
    pub fn with_rules(mut self, rules: RulesEngine<C>) -> Self {
        self.l5 = rules;
        self
    }
}

#[async_trait]
impl<C: Clock + 'static> Worker for MeadowsDaemon<C> {
    fn key(&self) -> &str {
        "meadows"
    }

    fn component(&self) -> Component {
        Component::Meadows
    }

    async fn run_cycle(&mut self, cx: &mut WorkerContext) -> Result<CycleReport, WorkerError> {
        self.cycle += 1;

        // BLOCK self-throttle: skip rule evaluation entirely, publish the
        // throttle event once per throttle window.
        if let Some(until) = self.throttled_until {
            if self.clock.now() < until {
                if !self.throttle_published {
                    self.throttle_published = true;
                    if !cx.dry_run {
                        cx.publisher.publish(
                            &cx.ssot,
                            &EVT_COOLDOWN_ACTIVE,
                            "L5:self_throttle_active",
                            json!({"cycle": self.cycle, "meadows_level": 5}),
                        )?;
                    }
                    warn!(cycle = self.cycle, "self-throttle active, skipping evaluation");
                }
                return Ok(CycleReport::default().tally("throttled_skips", 1));
            }
            self.throttled_until = None;
        }

        let fired = self.l6.tick(&cx.ssot, &cx.publisher, cx.dry_run)?;
        let outcomes = self.l5.evaluate_all(&cx.ssot, &cx.publisher, cx.dry_run)?;

        // A violated BLOCK rule throttles this engine for its cooldown.
        if let Some(block) = outcomes
            .iter()
            .find(|o| o.status == RuleStatus::Violated && o.action == Some(RuleAction::Block))
        {
            let cooldown = self.l5.cooldown_of(&block.id);
            self.throttled_until = Some(self.clock.now() + cooldown);
            self.throttle_published = false;
            warn!(rule = %block.id, "BLOCK violation, engine will self-throttle");
        }

        let proposed = self.l4.evaluate_topology(&cx.ssot, &cx.publisher, &outcomes, cx.dry_run)?;
        let enacted = self.l4.enact_mature(&cx.ssot, &cx.publisher, cx.dry_run)?;
        for proposal in &enacted {
            let receipt = self
                .hooks
                .enact(proposal.action, &proposal.target)
                .await
                .unwrap_or_else(|e| format!("enactment failed: {e}"));
            info!(proposal = %proposal.id, %receipt, "structural proposal enacted");
        }

        let mut sbe_passed = 0i64;
        let mut sbe_failed = 0i64;
        if self.cycle % SBE_EVERY_N == 0 {
            let summary = validate_all(&cx.ssot)?;
            sbe_passed = summary.passed;
            sbe_failed = summary.failed;
            if !cx.dry_run {
                cx.publisher.publish(
                    &cx.ssot,
                    &EVT_SBE_VALIDATION,
                    &format!("SBE:{}_pass_{}_fail", summary.passed, summary.failed),
                    serde_json::to_value(&summary)
                        .map_err(|e| WorkerError::internal(e.to_string()))?,
                )?;

                let spell_state =
                    hfo_supervisor::SpellState::load(&cx.paths.spell_state());
                let active: Vec<String> = spell_state
                    .daemons
                    .iter()
                    .filter(|(_, r)| hfo_supervisor::pid_alive(r.pid))
                    .map(|(k, _)| k.clone())
                    .collect();
                self.l4
                    .write_topology_snapshot(&cx.ssot, &cx.publisher, &active)?;
            }
        }

        let violations = outcomes
            .iter()
            .filter(|o| o.status == RuleStatus::Violated)
            .count() as i64;
        if !cx.dry_run {
            cx.publisher.publish(
                &cx.ssot,
                &EVT_ENGINE_TICK,
                &format!("TICK:{}", self.cycle),
                json!({
                    "cycle": self.cycle,
                    "subscriptions_fired": fired,
                    "rule_violations": violations,
                    "proposals_new": proposed.len(),
                    "proposals_enacted": enacted.len(),
                }),
            )?;
        }

        Ok(CycleReport::default()
            .tally("subscriptions_fired", fired.len() as i64)
            .tally("rule_violations", violations)
            .tally("proposals_new", proposed.len() as i64)
            .tally("proposals_enacted", enacted.len() as i64)
            .tally("sbe_passed", sbe_passed)
            .tally("sbe_failed", sbe_failed))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
