// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The five powers of the spell gate: summon, scrying, banish, sending,
//! and the watchdog.

use crate::error::GateError;
use crate::preflight::{preflight_check, PreflightReport};
use crate::process::{kill_hard, pid_alive, spawn_detached, terminate};
use crate::registry::Registry;
use crate::state::{DaemonRecord, SpellState};
use chrono::{SecondsFormat, Utc};
use fs2::FileExt;
use hfo_core::{Component, EventType, FaultKind, Paths};
use hfo_model::PrimaryClient;
use hfo_store::{Publisher, Ssot};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs::File;
use std::time::Duration;
use tracing::{info, warn};

const EVT_SUMMON: EventType = EventType::new(Component::SpellGate, "summon");
const EVT_INCARNATE: EventType = EventType::new(Component::SpellGate, "incarnate");
const EVT_BANISH: EventType = EventType::new(Component::SpellGate, "banish");
const EVT_ERROR: EventType = EventType::new(Component::SpellGate, "error");

/// Timing knobs; tests shrink these.
#[derive(Debug, Clone)]
pub struct GateOptions {
    /// Settling interval between spawn and the liveness check.
    pub settle: Duration,
    /// Grace window between SIGTERM and hard kill.
    pub grace: Duration,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(3),
            grace: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummonStatus {
    Summoned,
    SummonedButUncertain,
    AlreadyRunning,
    PreflightFailed,
    DryRun,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummonReceipt {
    pub status: SummonStatus,
    pub key: String,
    pub daemon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub alive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub ssot_row: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preflight: Option<PreflightReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BanishStatus {
    Banished,
    BanishFailed,
    AlreadyDead,
    DryRun,
}

#[derive(Debug, Clone, Serialize)]
pub struct BanishReceipt {
    pub status: BanishStatus,
    pub key: String,
    pub pid: u32,
    pub clean_exit: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaemonStatusView {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub port: String,
    pub commander: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summoned_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    pub spell_cast: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_subject: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FleetView {
    pub fleet: BTreeMap<String, DaemonStatusView>,
    pub total: usize,
    pub alive: usize,
    pub dead: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchdogEntry {
    pub name: String,
    pub pid: u32,
    pub alive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resummoned: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchdogReport {
    pub results: BTreeMap<String, WatchdogEntry>,
    pub deaths: usize,
}

/// The spell gate. Owns its store handle and the state file path; the
/// advisory lock is taken per mutating operation.
pub struct Gate {
    paths: Paths,
    registry: Registry,
    ssot: Ssot,
    publisher: Publisher,
    primary: PrimaryClient,
    options: GateOptions,
}

impl Gate {
    pub fn new(paths: Paths, registry: Registry, ssot: Ssot) -> Result<Self, GateError> {
        Self::with_options(paths, registry, ssot, GateOptions::default())
    }

    pub fn with_options(
        paths: Paths,
        registry: Registry,
        ssot: Ssot,
        options: GateOptions,
    ) -> Result<Self, GateError> {
        let generation = hfo_core::env::generation();
        let publisher = Publisher::for_component(Component::SpellGate, &generation);
        let primary = PrimaryClient::from_env().map_err(|e| GateError::Spawn(e.to_string()))?;
        Ok(Self {
            paths,
            registry,
            ssot,
            publisher,
            primary,
            options,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn ssot(&self) -> &Ssot {
        &self.ssot
    }

    /// SUMMON_FAMILIAR: validate and launch a daemon as a detached
    /// background process.
    pub async fn summon(
        &mut self,
        key: &str,
        extra_args: &[String],
        dry_run: bool,
        force: bool,
    ) -> Result<SummonReceipt, GateError> {
        let spec = self.resolve(key)?.clone();
        let _lock = self.lock()?;
        let mut state = SpellState::load(&self.paths.spell_state());
        let mut preflight =
            preflight_check(&spec, &self.paths.ssot_db(), &state, &self.primary).await;

        if preflight.already_running {
            if force {
                let pid = preflight.running_pid.unwrap_or(0);
                info!(key, pid, "force set, banishing existing daemon first");
                self.banish_locked(&mut state, key, &spec.spell_cast, dry_run)?;
                tokio::time::sleep(self.options.grace.min(Duration::from_secs(2))).await;
                preflight =
                    preflight_check(&spec, &self.paths.ssot_db(), &state, &self.primary).await;
            } else {
                return Ok(SummonReceipt {
                    status: SummonStatus::AlreadyRunning,
                    key: spec.key.clone(),
                    daemon: spec.display_name.clone(),
                    pid: preflight.running_pid,
                    alive: true,
                    log_file: None,
                    command: None,
                    ssot_row: 0,
                    preflight: Some(preflight),
                });
            }
        }

        if !preflight.passed {
            let failed: Vec<_> = preflight
                .failed_checks()
                .iter()
                .map(|c| json!({"name": c.name, "detail": c.detail}))
                .collect();
            let mut ssot_row = 0;
            if !dry_run {
                ssot_row = self.publisher.publish_fault(
                    &self.ssot,
                    &EVT_ERROR,
                    &format!("SUMMON_FAILED:{}", spec.key),
                    FaultKind::PreflightFailed,
                    "preflight failed",
                    json!({"daemon": spec.key, "failed_checks": failed}),
                )?;
            }
            return Ok(SummonReceipt {
                status: SummonStatus::PreflightFailed,
                key: spec.key.clone(),
                daemon: spec.display_name.clone(),
                pid: None,
                alive: false,
                log_file: None,
                command: None,
                ssot_row,
                preflight: Some(preflight),
            });
        }

        if dry_run {
            return Ok(SummonReceipt {
                status: SummonStatus::DryRun,
                key: spec.key.clone(),
                daemon: spec.display_name.clone(),
                pid: None,
                alive: false,
                log_file: None,
                command: Some(spec.command_line(extra_args)),
                ssot_row: 0,
                preflight: Some(preflight),
            });
        }

        // Launch
        let log_file = self.paths.daemon_log(&spec.key);
        let mut full_args = spec.default_args.clone();
        full_args.extend(extra_args.iter().cloned());
        let banner = format!("SUMMON_FAMILIAR: {}", spec.display_name);
        let pid = spawn_detached(&spec.program, &full_args, &log_file, &self.paths.root, &banner)?;
        info!(key, pid, "daemon launched");

        tokio::time::sleep(self.options.settle).await;
        let alive = pid_alive(pid);

        state.daemons.insert(
            spec.key.clone(),
            DaemonRecord {
                name: spec.display_name.clone(),
                pid,
                port: spec.port.to_string(),
                commander: spec.commander.clone(),
                script: spec.program.display().to_string(),
                args: full_args,
                summoned_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
                alive,
                log_file: log_file.display().to_string(),
                spell_cast: spec.spell_cast.clone(),
                model: spec.required_model.clone().unwrap_or_default(),
            },
        );
        state.save(&self.paths.spell_state())?;

        let ssot_row = self.publisher.publish(
            &self.ssot,
            &EVT_SUMMON,
            &format!("SUMMON:{}:{}:{pid}", spec.key, spec.port),
            json!({
                "spell": "SUMMON_FAMILIAR",
                "daemon_key": spec.key,
                "daemon_name": spec.display_name,
                "port": spec.port,
                "commander": spec.commander,
                "pid": pid,
                "alive_after_settle": alive,
                "script": spec.program.display().to_string(),
                "model": spec.required_model.clone().unwrap_or_else(|| "none".into()),
                "interval_s": spec.cycle_interval_s,
                "log_file": log_file.display().to_string(),
                "spell_cast": spec.spell_cast,
            }),
        )?;

        if alive {
            self.publisher.publish(
                &self.ssot,
                &EVT_INCARNATE,
                &format!("INCARNATE:{}:{pid}", spec.key),
                json!({
                    "daemon_key": spec.key,
                    "daemon_name": spec.display_name,
                    "pid": pid,
                    "port": spec.port,
                    "spell_cast": spec.spell_cast,
                }),
            )?;
        } else {
            warn!(key, pid, "daemon may have exited during settle window");
        }

        Ok(SummonReceipt {
            status: if alive {
                SummonStatus::Summoned
            } else {
                SummonStatus::SummonedButUncertain
            },
            key: spec.key.clone(),
            daemon: spec.display_name.clone(),
            pid: Some(pid),
            alive,
            log_file: Some(log_file.display().to_string()),
            command: None,
            ssot_row,
            preflight: Some(preflight),
        })
    }

    /// SCRYING: status for one daemon or the whole fleet.
    pub fn scrying(&self, key: Option<&str>) -> Result<FleetView, GateError> {
        let state = SpellState::load(&self.paths.spell_state());
        let mut fleet = BTreeMap::new();

        let keys: Vec<String> = match key {
            Some(k) => {
                self.resolve(k)?;
                vec![k.to_string()]
            }
            None => self.registry.keys(),
        };

        for k in keys {
            let spec = match self.registry.get(&k) {
                Some(s) => s,
                None => continue,
            };
            let view = match state.daemons.get(&k) {
                Some(record) => {
                    let alive = pid_alive(record.pid);
                    DaemonStatusView {
                        name: record.name.clone(),
                        status: if alive { "ALIVE" } else { "DEAD" }.into(),
                        pid: Some(record.pid),
                        port: record.port.clone(),
                        commander: record.commander.clone(),
                        summoned_at: Some(record.summoned_at.clone()),
                        log_file: Some(record.log_file.clone()),
                        spell_cast: record.spell_cast.clone(),
                        last_heartbeat: None,
                        last_heartbeat_subject: None,
                    }
                }
                None => DaemonStatusView {
                    name: spec.display_name.clone(),
                    status: "NEVER_SUMMONED".into(),
                    pid: None,
                    port: spec.port.to_string(),
                    commander: spec.commander.clone(),
                    summoned_at: None,
                    log_file: None,
                    spell_cast: spec.spell_cast.clone(),
                    last_heartbeat: None,
                    last_heartbeat_subject: None,
                },
            };
            fleet.insert(k, view);
        }

        let alive = fleet.values().filter(|v| v.status == "ALIVE").count();
        let dead = fleet.values().filter(|v| v.status == "DEAD").count();
        Ok(FleetView {
            total: fleet.len(),
            alive,
            dead,
            fleet,
        })
    }

    /// SENDING: scrying enriched with last heartbeats from the trail.
    pub fn sending(&self) -> Result<FleetView, GateError> {
        let mut view = self.scrying(None)?;
        for (key, status) in view.fleet.iter_mut() {
            if let Ok(Some((timestamp, subject))) =
                self.ssot.last_heartbeat(&format!("%{key}%"))
            {
                status.last_heartbeat = Some(timestamp);
                status.last_heartbeat_subject = Some(subject);
            }
        }
        Ok(view)
    }

    /// BANISH: gracefully stop a daemon (terminate, wait, hard kill).
    pub fn banish(&mut self, key: &str, dry_run: bool) -> Result<BanishReceipt, GateError> {
        let spec = self.resolve(key)?;
        let spell_cast = spec.spell_cast.clone();
        let _lock = self.lock()?;
        let mut state = SpellState::load(&self.paths.spell_state());
        self.banish_locked(&mut state, key, &spell_cast, dry_run)
    }

    fn banish_locked(
        &self,
        state: &mut SpellState,
        key: &str,
        _spell_cast: &str,
        dry_run: bool,
    ) -> Result<BanishReceipt, GateError> {
        let record = state.daemons.get(key).cloned();
        let pid = record.as_ref().map(|r| r.pid).unwrap_or(0);

        if pid == 0 || !pid_alive(pid) {
            return Ok(BanishReceipt {
                status: BanishStatus::AlreadyDead,
                key: key.to_string(),
                pid,
                clean_exit: true,
            });
        }

        if dry_run {
            return Ok(BanishReceipt {
                status: BanishStatus::DryRun,
                key: key.to_string(),
                pid,
                clean_exit: false,
            });
        }

        info!(key, pid, "banishing");
        terminate(pid);
        let deadline = std::time::Instant::now() + self.options.grace;
        while pid_alive(pid) && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(100));
        }
        if pid_alive(pid) {
            warn!(key, pid, "grace window elapsed, escalating to hard kill");
            kill_hard(pid);
            std::thread::sleep(Duration::from_millis(200));
        }
        let still_alive = pid_alive(pid);

        state.daemons.remove(key);
        state.save(&self.paths.spell_state())?;

        let name = record.map(|r| r.name).unwrap_or_else(|| key.to_string());
        self.publisher.publish(
            &self.ssot,
            &EVT_BANISH,
            &format!("BANISH:{key}:{pid}"),
            json!({
                "daemon_key": key,
                "daemon_name": name,
                "pid": pid,
                "clean_exit": !still_alive,
            }),
        )?;

        Ok(BanishReceipt {
            status: if still_alive {
                BanishStatus::BanishFailed
            } else {
                BanishStatus::Banished
            },
            key: key.to_string(),
            pid,
            clean_exit: !still_alive,
        })
    }

    /// Watchdog: detect deaths, publish them, optionally resurrect
    /// persistent daemons.
    pub async fn watchdog_tick(&mut self, auto_resurrect: bool) -> Result<WatchdogReport, GateError> {
        let state = SpellState::load(&self.paths.spell_state());
        let mut results = BTreeMap::new();
        let mut deaths = 0;

        for (key, record) in &state.daemons {
            let alive = pid_alive(record.pid);
            let mut entry = WatchdogEntry {
                name: record.name.clone(),
                pid: record.pid,
                alive,
                resummoned: None,
            };

            if !alive {
                deaths += 1;
                warn!(%key, pid = record.pid, "watchdog detected death");
                self.publisher.publish_fault(
                    &self.ssot,
                    &EVT_ERROR,
                    &format!("DAEMON_DEATH:{key}:{}", record.pid),
                    FaultKind::Dead,
                    "recorded pid no longer alive",
                    json!({
                        "daemon_key": key,
                        "daemon_name": record.name,
                        "pid": record.pid,
                        "port": record.port,
                        "was_summoned_at": record.summoned_at,
                        "detected_by": "watchdog",
                    }),
                )?;

                let persistent = self
                    .registry
                    .get(key)
                    .map(|s| s.is_persistent)
                    .unwrap_or(false);
                if auto_resurrect && persistent {
                    let receipt = self.summon(key, &[], false, true).await?;
                    entry.resummoned = Some(format!("{:?}", receipt.status));
                }
            }
            results.insert(key.clone(), entry);
        }

        Ok(WatchdogReport { results, deaths })
    }

    fn resolve(&self, key: &str) -> Result<&hfo_core::DaemonSpec, GateError> {
        self.registry.get(key).ok_or_else(|| GateError::UnknownDaemon {
            key: key.to_string(),
            known: self.registry.keys().join(", "),
        })
    }

    /// Advisory lock scoped to one mutating operation.
    fn lock(&self) -> Result<File, GateError> {
        let path = self.paths.spell_lock();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| GateError::Locked(path))?;
        Ok(file)
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
