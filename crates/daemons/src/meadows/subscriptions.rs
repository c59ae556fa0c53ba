// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! L6 — information flows. Declarative subscriptions over the trail;
//! actions only emit derivative events.

use hfo_core::{Clock, Component, EventType};
use hfo_store::{Publisher, Ssot};
use hfo_worker::WorkerError;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const EVT_DEAD_DAEMON: EventType = EventType::new(Component::Meadows, "l6.dead_daemon");
const EVT_CHAIN_BREAK: EventType = EventType::new(Component::Meadows, "l6.chain_break");
const EVT_EVENT_ROUTED: EventType = EventType::new(Component::Meadows, "l6.event_routed");
const EVT_NATARAJA: EventType = EventType::new(Component::Meadows, "l5.nataraja_score");

/// Source tags every known daemon publishes under.
const DAEMON_SOURCES: &[(&str, &str)] = &[
    ("p0_watcher", "Lidless Watcher"),
    ("singer_daemon", "Singer"),
    ("song_prospector", "Song Prospector"),
    ("p6_kraken_loop", "Kraken"),
    ("p7_compute_queue", "Compute Queue"),
];

/// What a subscription does when its pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    /// Daemons that published within 24h but not within the last hour.
    DeadDaemonCheck,
    /// Unmatched perceives point at abandoned sessions.
    ChainCheck,
    /// Route resource-pressure events toward consumers.
    RoutePressure,
    /// Kill-rate x rebirth-rate health score.
    NatarajaScore,
}

/// An L6 subscription: pattern + cooldown + action.
pub struct Subscription {
    pub name: &'static str,
    pub event_pattern: &'static str,
    pub min_interval: Duration,
    pub action: SubscriptionAction,
    pub enabled: bool,
    last_fired: Option<Instant>,
    fire_count: u64,
}

impl Subscription {
    fn new(
        name: &'static str,
        event_pattern: &'static str,
        min_interval: Duration,
        action: SubscriptionAction,
    ) -> Self {
        Self {
            name,
            event_pattern,
            min_interval,
            action,
            enabled: true,
            last_fired: None,
            fire_count: 0,
        }
    }
}

/// The L6 engine.
pub struct InfoFlowEngine<C: Clock> {
    clock: C,
    subscriptions: Vec<Subscription>,
}

impl<C: Clock> InfoFlowEngine<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            subscriptions: vec![
                Subscription::new(
                    "dead_daemon_detector",
                    "%heartbeat%",
                    Duration::from_secs(300),
                    SubscriptionAction::DeadDaemonCheck,
                ),
                Subscription::new(
                    "chain_monitor",
                    "%perceive%",
                    Duration::from_secs(120),
                    SubscriptionAction::ChainCheck,
                ),
                Subscription::new(
                    "resource_pressure_router",
                    "%budget_breach%",
                    Duration::from_secs(60),
                    SubscriptionAction::RoutePressure,
                ),
                Subscription::new(
                    "nataraja_score_tracker",
                    "%p4%",
                    Duration::from_secs(600),
                    SubscriptionAction::NatarajaScore,
                ),
            ],
        }
    }

    /// One scan cycle: fire each off-cooldown subscription whose pattern
    /// matched anything recently. Returns the names that fired.
    pub fn tick(
        &mut self,
        ssot: &Ssot,
        publisher: &Publisher,
        dry_run: bool,
    ) -> Result<Vec<String>, WorkerError> {
        let now = self.clock.now();
        let mut fired = Vec::new();

        for sub in &mut self.subscriptions {
            if !sub.enabled {
                continue;
            }
            if let Some(last) = sub.last_fired {
                if now.duration_since(last) < sub.min_interval {
                    continue;
                }
            }
            let window_minutes = (sub.min_interval.as_secs() as i64 / 60).max(30);
            let matches = ssot.count_by_pattern(sub.event_pattern, window_minutes)?;
            if matches == 0 {
                continue;
            }
            if !dry_run {
                if let Err(e) = run_action(sub.action, ssot, publisher) {
                    warn!(subscription = sub.name, "action failed: {e}");
                    continue;
                }
            }
            sub.last_fired = Some(now);
            sub.fire_count += 1;
            debug!(subscription = sub.name, fires = sub.fire_count, "fired");
            fired.push(sub.name.to_string());
        }
        Ok(fired)
    }
}

fn run_action(
    action: SubscriptionAction,
    ssot: &Ssot,
    publisher: &Publisher,
) -> Result<(), WorkerError> {
    match action {
        SubscriptionAction::DeadDaemonCheck => {
            let active = ssot.active_sources(60)?;
            let mut dead = Vec::new();
            for (tag, name) in DAEMON_SOURCES {
                if active.iter().any(|s| s.contains(tag)) {
                    continue;
                }
                let ever_active = ssot.count_by_source(&format!("%{tag}%"), 24 * 60)?;
                if ever_active > 0 {
                    dead.push(json!({"name": name, "source": tag}));
                }
            }
            if !dead.is_empty() {
                publisher.publish(
                    ssot,
                    &EVT_DEAD_DAEMON,
                    "L6:dead_daemon_detected",
                    json!({
                        "dead_daemons": dead,
                        "total_dead": dead.len(),
                        "meadows_level": 6,
                        "action": "ADVISORY",
                    }),
                )?;
            }
        }
        SubscriptionAction::ChainCheck => {
            let perceives = ssot.count_by_pattern("%perceive%", 120)?;
            let yields = ssot.count_by_pattern("%yield%", 120)?;
            let gap = perceives - yields;
            if gap > 2 {
                publisher.publish(
                    ssot,
                    &EVT_CHAIN_BREAK,
                    "L6:chain_break",
                    json!({
                        "perceive_count": perceives,
                        "yield_count": yields,
                        "gap": gap,
                        "meadows_level": 6,
                        "action": "ADVISORY",
                    }),
                )?;
            }
        }
        SubscriptionAction::RoutePressure => {
            let breaches = ssot.query_by_pattern("%budget_breach%", 60, 5)?;
            if let Some(breach) = breaches.first() {
                publisher.publish(
                    ssot,
                    &EVT_EVENT_ROUTED,
                    "L6:resource_pressure_routed",
                    json!({
                        "original_event_type": breach.event_type,
                        "severity": "HIGH",
                        "meadows_level": 6,
                    }),
                )?;
            }
        }
        SubscriptionAction::NatarajaScore => {
            let p4 = ssot.count_by_pattern("%.p4.%", 24 * 60)?;
            let p5 = ssot.count_by_pattern("%.p5.%", 24 * 60)?;
            let total = ssot.count_by_pattern("%", 24 * 60)?;
            if total == 0 {
                return Ok(());
            }
            let p4_rate = p4 as f64 / total as f64;
            let p5_rate = p5 as f64 / total as f64;
            let score = p4_rate * p5_rate * 10_000.0;
            publisher.publish(
                ssot,
                &EVT_NATARAJA,
                "L5:nataraja_score",
                json!({
                    "p4_events_24h": p4,
                    "p5_events_24h": p5,
                    "total_events_24h": total,
                    "nataraja_score": (score * 10_000.0).round() / 10_000.0,
                    "interpretation": if score > 1.0 { "ANTIFRAGILE" } else if score > 0.0 { "FRAGILE" } else { "INERT" },
                    "meadows_level": 5,
                }),
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "subscriptions_tests.rs"]
mod tests;
