// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! L5 — rules of the system. Typed conditions evaluated against live
//! state, with per-rule cooldowns. A violated BLOCK rule makes the
//! engine self-throttle; everything else is advisory.

use hfo_core::{Clock, Component, EventType};
use hfo_store::{Publisher, Ssot};
use hfo_worker::WorkerError;
use serde::Serialize;
use serde_json::json;
use std::time::{Duration, Instant};

const EVT_RULE_VIOLATED: EventType = EventType::new(Component::Meadows, "l5.rule_violated");

/// What a violation triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleAction {
    Advisory,
    Alert,
    Block,
}

/// A typed condition returning a scalar to compare against a threshold.
#[derive(Debug, Clone)]
pub enum RuleCondition {
    /// Events from sources matching a LIKE pattern within a window.
    SourceEventCount {
        source_pattern: String,
        window_minutes: i64,
    },
    /// Events whose type matches a LIKE pattern within a window.
    TypeEventCount {
        type_pattern: String,
        window_minutes: i64,
    },
    /// Count(left) - count(right): unmatched-pair detection.
    PatternGap {
        left: String,
        right: String,
        window_minutes: i64,
    },
    /// Events whose payload contains a needle, scoped by source.
    PayloadMatch {
        needle: String,
        source_pattern: String,
        window_minutes: i64,
    },
}

impl RuleCondition {
    pub fn evaluate(&self, ssot: &Ssot) -> Result<i64, WorkerError> {
        let value = match self {
            RuleCondition::SourceEventCount {
                source_pattern,
                window_minutes,
            } => ssot.count_by_source(source_pattern, *window_minutes)?,
            RuleCondition::TypeEventCount {
                type_pattern,
                window_minutes,
            } => ssot.count_by_pattern(type_pattern, *window_minutes)?,
            RuleCondition::PatternGap {
                left,
                right,
                window_minutes,
            } => {
                ssot.count_by_pattern(left, *window_minutes)?
                    - ssot.count_by_pattern(right, *window_minutes)?
            }
            RuleCondition::PayloadMatch {
                needle,
                source_pattern,
                window_minutes,
            } => ssot.count_payload_matches(needle, source_pattern, *window_minutes)?,
        };
        Ok(value)
    }
}

/// One governance rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub condition: RuleCondition,
    /// Violated when the condition's value exceeds this.
    pub threshold: i64,
    pub action: RuleAction,
    pub cooldown: Duration,
    pub enabled: bool,
    last_fired: Option<Instant>,
    violation_count: u64,
}

impl Rule {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        condition: RuleCondition,
        threshold: i64,
        action: RuleAction,
        cooldown: Duration,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            condition,
            threshold,
            action,
            cooldown,
            enabled: true,
            last_fired: None,
            violation_count: 0,
        }
    }
}

/// Evaluation status per rule per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    Ok,
    Violated,
    Cooldown,
    Disabled,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleOutcome {
    pub id: String,
    pub name: String,
    pub status: RuleStatus,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<RuleAction>,
}

/// The L5 engine.
pub struct RulesEngine<C: Clock> {
    clock: C,
    rules: Vec<Rule>,
    /// Throttle point as a fraction of the BLOCK budget.
    pub self_throttle_at: i64,
}

impl<C: Clock> RulesEngine<C> {
    /// Core rule set.
    pub fn new(clock: C) -> Self {
        let rules = vec![
            Rule::new(
                "L5-R01",
                "event_rate_budget",
                "No more than 100 events per hour from engine sources",
                RuleCondition::SourceEventCount {
                    source_pattern: "%meadows%".into(),
                    window_minutes: 60,
                },
                100,
                RuleAction::Block,
                Duration::from_secs(300),
            ),
            Rule::new(
                "L5-R02",
                "vram_budget_guard",
                "Model-memory budget breaches observed recently",
                RuleCondition::TypeEventCount {
                    type_pattern: "%budget_breach%".into(),
                    window_minutes: 15,
                },
                0,
                RuleAction::Alert,
                Duration::from_secs(600),
            ),
            Rule::new(
                "L5-R03",
                "medallion_boundary_gate",
                "Bronze sources must not claim gold",
                RuleCondition::PayloadMatch {
                    needle: "\"medallion\":\"gold\"".into(),
                    source_pattern: "%bronze%".into(),
                    window_minutes: 60,
                },
                0,
                RuleAction::Alert,
                Duration::from_secs(60),
            ),
            Rule::new(
                "L5-R04",
                "orphan_guard",
                "No more than 5 unmatched perceives in 30 minutes",
                RuleCondition::PatternGap {
                    left: "%perceive%".into(),
                    right: "%yield%".into(),
                    window_minutes: 30,
                },
                5,
                RuleAction::Advisory,
                Duration::from_secs(300),
            ),
        ];
        Self {
            clock,
            rules,
            self_throttle_at: 80,
        }
    }

    /// An engine with an explicit rule set (tests).
    pub fn with_rules(clock: C, rules: Vec<Rule>) -> Self {
        Self {
            clock,
            rules,
            self_throttle_at: 80,
        }
    }

    pub fn cooldown_of(&self, rule_id: &str) -> Duration {
        self.rules
            .iter()
            .find(|r| r.id == rule_id)
            .map(|r| r.cooldown)
            .unwrap_or(Duration::from_secs(300))
    }

    /// Evaluate every enabled rule off cooldown. Violations publish one
    /// event each.
    pub fn evaluate_all(
        &mut self,
        ssot: &Ssot,
        publisher: &Publisher,
        dry_run: bool,
    ) -> Result<Vec<RuleOutcome>, WorkerError> {
        let now = self.clock.now();
        let mut outcomes = Vec::new();

        for rule in &mut self.rules {
            if !rule.enabled {
                outcomes.push(RuleOutcome {
                    id: rule.id.clone(),
                    name: rule.name.clone(),
                    status: RuleStatus::Disabled,
                    value: 0,
                    action: None,
                });
                continue;
            }
            if let Some(last) = rule.last_fired {
                if now.duration_since(last) < rule.cooldown {
                    outcomes.push(RuleOutcome {
                        id: rule.id.clone(),
                        name: rule.name.clone(),
                        status: RuleStatus::Cooldown,
                        value: 0,
                        action: None,
                    });
                    continue;
                }
            }

            let value = match rule.condition.evaluate(ssot) {
                Ok(v) => v,
                Err(_) => {
                    outcomes.push(RuleOutcome {
                        id: rule.id.clone(),
                        name: rule.name.clone(),
                        status: RuleStatus::Error,
                        value: 0,
                        action: None,
                    });
                    continue;
                }
            };

            let violated = value > rule.threshold;
            if violated {
                rule.violation_count += 1;
                rule.last_fired = Some(now);
                if !dry_run {
                    publisher.publish(
                        ssot,
                        &EVT_RULE_VIOLATED,
                        &format!("L5:{}:violated", rule.id),
                        json!({
                            "rule_id": rule.id,
                            "rule_name": rule.name,
                            "violation_value": value,
                            "threshold": rule.threshold,
                            "action": rule.action,
                            "total_violations": rule.violation_count,
                            "meadows_level": 5,
                        }),
                    )?;
                }
            }
            outcomes.push(RuleOutcome {
                id: rule.id.clone(),
                name: rule.name.clone(),
                status: if violated {
                    RuleStatus::Violated
                } else {
                    RuleStatus::Ok
                },
                value,
                action: violated.then_some(rule.action),
            });
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;
