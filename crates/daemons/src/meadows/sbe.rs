// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Self-validation: machine-executable acceptance criteria run against
//! live state every Nth cycle.

use hfo_store::Ssot;
use hfo_worker::WorkerError;
use serde::Serialize;

/// Outcome of one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SbeResult {
    Pass,
    Fail,
    Skip,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CriterionResult {
    pub id: &'static str,
    pub name: &'static str,
    pub given: &'static str,
    pub when: &'static str,
    pub then: &'static str,
    pub result: SbeResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct SbeSummary {
    pub passed: i64,
    pub failed: i64,
    pub skipped: i64,
    pub errored: i64,
    pub results: Vec<CriterionResult>,
}

struct Criterion {
    id: &'static str,
    name: &'static str,
    given: &'static str,
    when: &'static str,
    then: &'static str,
    check: fn(&Ssot) -> Result<SbeResult, WorkerError>,
}

const CRITERIA: &[Criterion] = &[
    Criterion {
        id: "SBE-01",
        name: "heartbeat_alive",
        given: "a running fleet",
        when: "the last 30 minutes of the trail are scanned",
        then: "at least one heartbeat event exists",
        check: check_heartbeat_alive,
    },
    Criterion {
        id: "SBE-02",
        name: "recent_stigmergy",
        given: "a live fabric",
        when: "the last 60 minutes of the trail are scanned",
        then: "at least one event of any type exists",
        check: check_recent_stigmergy,
    },
    Criterion {
        id: "SBE-03",
        name: "no_duplicate_hashes",
        given: "the append-only event log",
        when: "content hashes are grouped",
        then: "no hash appears more than once",
        check: check_no_duplicate_hashes,
    },
    Criterion {
        id: "SBE-04",
        name: "proposals_logged",
        given: "enacted structural changes",
        when: "each enact event is traced back",
        then: "an earlier proposal event shares its proposal_id",
        check: check_proposals_logged,
    },
    Criterion {
        id: "SBE-05",
        name: "cooldown_respected",
        given: "enacted structural changes",
        when: "proposal and enactment times are compared",
        then: "the gap is at least the proposal's cooldown",
        check: check_cooldown_respected,
    },
];

/// Run every criterion; never raises past a per-criterion ERROR.
pub fn validate_all(ssot: &Ssot) -> Result<SbeSummary, WorkerError> {
    let mut results = Vec::new();
    let (mut passed, mut failed, mut skipped, mut errored) = (0, 0, 0, 0);

    for criterion in CRITERIA {
        let result = (criterion.check)(ssot).unwrap_or(SbeResult::Error);
        match result {
            SbeResult::Pass => passed += 1,
            SbeResult::Fail => failed += 1,
            SbeResult::Skip => skipped += 1,
            SbeResult::Error => errored += 1,
        }
        results.push(CriterionResult {
            id: criterion.id,
            name: criterion.name,
            given: criterion.given,
            when: criterion.when,
            then: criterion.then,
            result,
        });
    }

    Ok(SbeSummary {
        passed,
        failed,
        skipped,
        errored,
        results,
    })
}

fn check_heartbeat_alive(ssot: &Ssot) -> Result<SbeResult, WorkerError> {
    if ssot.event_count()? == 0 {
        return Ok(SbeResult::Skip);
    }
    Ok(if ssot.count_by_pattern("%heartbeat%", 30)? > 0 {
        SbeResult::Pass
    } else {
        SbeResult::Fail
    })
}

fn check_recent_stigmergy(ssot: &Ssot) -> Result<SbeResult, WorkerError> {
    if ssot.event_count()? == 0 {
        return Ok(SbeResult::Skip);
    }
    Ok(if ssot.count_by_pattern("%", 60)? > 0 {
        SbeResult::Pass
    } else {
        SbeResult::Fail
    })
}

fn check_no_duplicate_hashes(ssot: &Ssot) -> Result<SbeResult, WorkerError> {
    Ok(if ssot.duplicate_hashes()? == 0 {
        SbeResult::Pass
    } else {
        SbeResult::Fail
    })
}

/// Two-phase law: every enactment has an earlier proposal sharing its id.
fn check_proposals_logged(ssot: &Ssot) -> Result<SbeResult, WorkerError> {
    let enacted = ssot.query_by_pattern("%l4.structure_enacted", 24 * 60, 50)?;
    if enacted.is_empty() {
        return Ok(SbeResult::Skip);
    }
    let proposals = ssot.query_by_pattern("%l4.structure_proposal", 24 * 60, 200)?;
    for enact in &enacted {
        let Some(pid) = enact.payload().get("proposal_id").and_then(|v| v.as_str()) else {
            return Ok(SbeResult::Fail);
        };
        let matched = proposals.iter().any(|p| {
            p.id < enact.id
                && p.payload().get("proposal_id").and_then(|v| v.as_str()) == Some(pid)
        });
        if !matched {
            return Ok(SbeResult::Fail);
        }
    }
    Ok(SbeResult::Pass)
}

/// Cooldown law: enactment time minus proposal time >= cooldown.
fn check_cooldown_respected(ssot: &Ssot) -> Result<SbeResult, WorkerError> {
    let enacted = ssot.query_by_pattern("%l4.structure_enacted", 24 * 60, 50)?;
    if enacted.is_empty() {
        return Ok(SbeResult::Skip);
    }
    for enact in &enacted {
        let payload = enact.payload();
        let proposed = payload
            .get("proposed_at_epoch_s")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let enacted_at = payload
            .get("enacted_at_epoch_s")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let cooldown = payload.get("cooldown_s").and_then(|v| v.as_u64()).unwrap_or(0);
        if enacted_at.saturating_sub(proposed) < cooldown {
            return Ok(SbeResult::Fail);
        }
    }
    Ok(SbeResult::Pass)
}

#[cfg(test)]
#[path = "sbe_tests.rs"]
mod tests;
