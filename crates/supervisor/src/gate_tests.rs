// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hfo_core::{ModelNeed, Port};
use serial_test::serial;
use tempfile::{tempdir, TempDir};

fn sleeper_spec(key: &str, program: &str) -> hfo_core::DaemonSpec {
    hfo_core::DaemonSpec {
        key: key.into(),
        display_name: format!("Test {key}"),
        port: Port::P0,
        commander: "Test Commander".into(),
        program: program.into(),
        default_args: vec!["300".into()],
        model_need: ModelNeed::None,
        required_model: None,
        min_memory_gb: 0.0,
        cycle_interval_s: 1.0,
        priority: 1,
        spell_cast: "TEST_SLEEP".into(),
        is_persistent: true,
    }
}

fn test_gate(dir: &TempDir) -> Gate {
    let paths = Paths::new(dir.path());
    let ssot = Ssot::open(paths.ssot_db()).unwrap();
    let mut registry = Registry::new();
    registry.register(sleeper_spec("watcher", "/bin/sleep"));
    registry.register(sleeper_spec("ghost", "/definitely/not/a/binary"));
    Gate::with_options(
        paths,
        registry,
        ssot,
        GateOptions {
            settle: Duration::from_millis(150),
            grace: Duration::from_secs(1),
        },
    )
    .unwrap()
}

#[tokio::test]
#[serial]
async fn test_summon_unknown_key_is_typed_error() {
    let dir = tempdir().unwrap();
    let mut gate = test_gate(&dir);
    let err = gate.summon("unknown", &[], false, false).await.unwrap_err();
    assert!(matches!(err, GateError::UnknownDaemon { .. }));
}

#[tokio::test]
#[serial]
async fn test_cold_start_summon_writes_two_events() {
    let dir = tempdir().unwrap();
    let mut gate = test_gate(&dir);
    assert_eq!(gate.ssot().event_count().unwrap(), 0);

    let receipt = gate.summon("watcher", &[], false, false).await.unwrap();
    assert_eq!(receipt.status, SummonStatus::Summoned);
    let pid = receipt.pid.unwrap();
    assert!(pid_alive(pid));

    // Exactly two new events: summon and incarnate.
    assert_eq!(gate.ssot().event_count().unwrap(), 2);
    let summon = gate.ssot().read_last_matching("%spell_gate.summon").unwrap().unwrap();
    let incarnate = gate.ssot().read_last_matching("%spell_gate.incarnate").unwrap().unwrap();
    assert!(incarnate.id > summon.id);

    // State file holds the record.
    let state = SpellState::load(&Paths::new(dir.path()).spell_state());
    assert_eq!(state.daemons.len(), 1);
    assert_eq!(state.daemons["watcher"].pid, pid);

    gate.banish("watcher", false).unwrap();
}

#[tokio::test]
#[serial]
async fn test_summon_twice_is_already_running() {
    let dir = tempdir().unwrap();
    let mut gate = test_gate(&dir);

    let first = gate.summon("watcher", &[], false, false).await.unwrap();
    let second = gate.summon("watcher", &[], false, false).await.unwrap();

    assert_eq!(second.status, SummonStatus::AlreadyRunning);
    assert_eq!(second.pid, first.pid);
    // No second process recorded.
    let state = SpellState::load(&Paths::new(dir.path()).spell_state());
    assert_eq!(state.daemons.len(), 1);

    gate.banish("watcher", false).unwrap();
}

#[tokio::test]
#[serial]
async fn test_preflight_failure_spawns_nothing_and_logs_once() {
    let dir = tempdir().unwrap();
    let mut gate = test_gate(&dir);

    let receipt = gate.summon("ghost", &[], false, false).await.unwrap();

    assert_eq!(receipt.status, SummonStatus::PreflightFailed);
    assert!(receipt.pid.is_none());
    let preflight = receipt.preflight.unwrap();
    assert!(preflight
        .failed_checks()
        .iter()
        .any(|c| c.name == "script_exists"));

    // A single error event, nothing else.
    assert_eq!(gate.ssot().event_count().unwrap(), 1);
    let event = gate.ssot().read_last_matching("%spell_gate.error").unwrap().unwrap();
    assert_eq!(
        event.payload().get("kind").and_then(|v| v.as_str()),
        Some("PREFLIGHT_FAILED")
    );
    // No state record.
    assert!(SpellState::load(&Paths::new(dir.path()).spell_state())
        .daemons
        .is_empty());
}

#[tokio::test]
#[serial]
async fn test_dry_run_shows_command_without_spawning() {
    let dir = tempdir().unwrap();
    let mut gate = test_gate(&dir);

    let receipt = gate.summon("watcher", &["--extra".into()], true, false).await.unwrap();

    assert_eq!(receipt.status, SummonStatus::DryRun);
    assert_eq!(receipt.command.as_deref(), Some("/bin/sleep 300 --extra"));
    assert_eq!(gate.ssot().event_count().unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn test_banish_completeness() {
    let dir = tempdir().unwrap();
    let mut gate = test_gate(&dir);

    let receipt = gate.summon("watcher", &[], false, false).await.unwrap();
    let pid = receipt.pid.unwrap();

    let banish = gate.banish("watcher", false).unwrap();
    assert_eq!(banish.status, BanishStatus::Banished);
    assert!(banish.clean_exit);
    assert!(!pid_alive(pid));
    assert!(SpellState::load(&Paths::new(dir.path()).spell_state())
        .daemons
        .is_empty());

    let event = gate.ssot().read_last_matching("%spell_gate.banish").unwrap().unwrap();
    assert_eq!(
        event.payload().get("daemon_key").and_then(|v| v.as_str()),
        Some("watcher")
    );
}

#[tokio::test]
#[serial]
async fn test_banish_never_summoned_is_already_dead() {
    let dir = tempdir().unwrap();
    let mut gate = test_gate(&dir);
    let receipt = gate.banish("watcher", false).unwrap();
    assert_eq!(receipt.status, BanishStatus::AlreadyDead);
}

#[tokio::test]
#[serial]
async fn test_watchdog_death_then_resurrection_order() {
    let dir = tempdir().unwrap();
    let mut gate = test_gate(&dir);

    let receipt = gate.summon("watcher", &[], false, false).await.unwrap();
    let pid = receipt.pid.unwrap();

    // Kill the daemon behind the gate's back.
    crate::process::kill_hard(pid);
    for _ in 0..50 {
        if !pid_alive(pid) {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    let report = gate.watchdog_tick(true).await.unwrap();
    assert_eq!(report.deaths, 1);
    assert_eq!(report.results["watcher"].resummoned.as_deref(), Some("Summoned"));

    // Death event precedes the resurrection summon event.
    let death = gate
        .ssot()
        .query_by_pattern("%spell_gate.error", 60, 10)
        .unwrap()
        .into_iter()
        .find(|e| e.subject.starts_with("DAEMON_DEATH"))
        .unwrap();
    let resummon = gate.ssot().read_last_matching("%spell_gate.summon").unwrap().unwrap();
    assert!(death.id < resummon.id);

    gate.banish("watcher", false).unwrap();
}

#[tokio::test]
#[serial]
async fn test_scrying_reports_fleet() {
    let dir = tempdir().unwrap();
    let mut gate = test_gate(&dir);

    let view = gate.scrying(None).unwrap();
    assert_eq!(view.total, 2);
    assert!(view.fleet.values().all(|v| v.status == "NEVER_SUMMONED"));

    gate.summon("watcher", &[], false, false).await.unwrap();
    let view = gate.scrying(Some("watcher")).unwrap();
    assert_eq!(view.alive, 1);
    assert_eq!(view.fleet["watcher"].status, "ALIVE");

    gate.banish("watcher", false).unwrap();
    let view = gate.scrying(None).unwrap();
    assert_eq!(view.alive, 0);
}
