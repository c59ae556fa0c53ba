// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hfo_core::Paths;
use hfo_store::{Publisher, Ssot};
use tempfile::tempdir;
use yare::parameterized;

#[parameterized(
    idle = { Pressure::Idle, 50, 5 },
    nominal = { Pressure::Nominal, 30, 3 },
    elevated = { Pressure::Elevated, 20, 2 },
    throttled = { Pressure::Throttled, 10, 0 },
    critical = { Pressure::Critical, 0, 0 },
)]
fn test_batch_table(pressure: Pressure, cheap: i64, expensive: i64) {
    assert_eq!(batch_sizes(pressure), (cheap, expensive));
}

fn test_cx(dry_run: bool) -> (tempfile::TempDir, WorkerContext) {
    let dir = tempdir().unwrap();
    let ssot = Ssot::open_in_memory().unwrap();
    let publisher = Publisher::for_component(Component::Kraken, "90");
    let cx = WorkerContext::new(Paths::new(dir.path()), ssot, publisher, dry_run).unwrap();
    (dir, cx)
}

#[tokio::test]
async fn test_cold_start_cycle_is_degenerate_but_correct() {
    // Empty trail, empty corpus: the loop still completes and publishes
    // its pulse.
    let (_dir, mut cx) = test_cx(false);
    let mut kraken = KrakenDaemon::new();

    let report = kraken.run_cycle(&mut cx).await.unwrap();

    assert_eq!(report.tallies.get("embedded"), Some(&0));
    assert_eq!(report.tallies.get("enriched"), Some(&0));

    let pulse = cx.ssot.read_last_matching("%kraken.loop.pulse").unwrap().unwrap();
    assert!(pulse.payload().get("pressure").is_some());
    // Whenever the pressure table granted a batch, the arm's event landed.
    let cheap_batch = pulse.payload().get("cheap_batch").and_then(|v| v.as_i64()).unwrap();
    let expensive_batch = pulse.payload().get("expensive_batch").and_then(|v| v.as_i64()).unwrap();
    if cheap_batch > 0 {
        assert!(cx.ssot.read_last_matching("%kraken.npu.discovery").unwrap().is_some());
    }
    if expensive_batch > 0 {
        assert!(cx.ssot.read_last_matching("%kraken.gpu.enrichment").unwrap().is_some());
    }
}

#[tokio::test]
async fn test_bounded_growth_over_n_ticks() {
    // With no external input, N ticks produce at most N * K events
    // (discovery + enrichment + pulse + periodic health).
    let (_dir, mut cx) = test_cx(false);
    let mut kraken = KrakenDaemon::new();

    let n = 12;
    for _ in 0..n {
        kraken.run_cycle(&mut cx).await.unwrap();
    }

    let total = cx.ssot.event_count().unwrap();
    assert!(total <= n * 4, "event growth unbounded: {total} events after {n} ticks");
    // The pulse always lands, whatever the pressure table allowed.
    assert!(total >= n);
}

#[tokio::test]
async fn test_arms_communicate_only_via_trail() {
    // Seed a discovery event as if from a previous sensing pass of a
    // different process; the shaping arm must pick it up with no shared
    // memory.
    let (_dir, cx) = test_cx(true);
    for n in 0..3 {
        cx.ssot
            .insert_document(&format!("d{n}"), "body", "", "t", "P6", "note", 100)
            .unwrap();
    }
    cx.publisher
        .publish_raw(
            &cx.ssot,
            "hfo.gen90.kraken.npu.discovery",
            "DISCOVERY:external",
            serde_json::json!({"embedded": [1], "clusters": [[1, 2]], "outliers": []}),
        )
        .unwrap();

    let arm = ExpensiveArm::new();
    let targets = arm.prioritize(&cx, 2).unwrap();
    assert_eq!(targets, vec![1, 2]);
}
