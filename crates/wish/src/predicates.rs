// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The predicate registry Pass 3 writes and Pass 4 reads.
//!
//! Stub predicates always pass until real domain logic replaces them;
//! the registry is the seam that keeps Pass 4 unchanged when that
//! happens.

use hfo_store::Ssot;
use serde::Serialize;
use std::collections::BTreeMap;

/// Deterministic registry name for a task card id.
pub fn predicate_name(task_id: &str) -> String {
    format!("wish_v2_{}", task_id.to_lowercase().replace('-', "_"))
}

/// What a predicate actually verifies.
#[derive(Debug, Clone)]
pub enum PredicateCheck {
    /// Stub: always grants. Real predicates replace this variant.
    AlwaysPass,
    /// Grants when events matching the pattern exist in the window.
    EventsExist {
        pattern: String,
        window_minutes: i64,
    },
}

impl PredicateCheck {
    pub fn evaluate(&self, ssot: &Ssot) -> (bool, Vec<String>) {
        match self {
            PredicateCheck::AlwaysPass => (true, Vec::new()),
            PredicateCheck::EventsExist {
                pattern,
                window_minutes,
            } => match ssot.count_by_pattern(pattern, *window_minutes) {
                Ok(count) if count > 0 => (true, Vec::new()),
                Ok(_) => (
                    false,
                    vec![format!("no events matching {pattern} in {window_minutes}m")],
                ),
                Err(e) => (false, vec![format!("store error: {e}")]),
            },
        }
    }
}

/// A registered predicate with its acceptance clauses.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub name: String,
    pub given: String,
    pub when: String,
    pub then: String,
    pub check: PredicateCheck,
}

/// One predicate's outcome under Pass 4.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub name: String,
    pub verdict: &'static str,
    pub violations: Vec<String>,
}

/// Process-local registry, observable by Pass 4.
#[derive(Debug, Default)]
pub struct PredicateRegistry {
    predicates: BTreeMap<String, Predicate>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, predicate: Predicate) {
        self.predicates.insert(predicate.name.clone(), predicate);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.predicates.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Evaluate one registered predicate against live state.
    pub fn evaluate(&self, name: &str, ssot: &Ssot) -> Option<Verdict> {
        let predicate = self.predicates.get(name)?;
        let (granted, violations) = predicate.check.evaluate(ssot);
        Some(Verdict {
            name: name.to_string(),
            verdict: if granted { "GRANTED" } else { "DENIED" },
            violations,
        })
    }
}

#[cfg(test)]
#[path = "predicates_tests.rs"]
mod tests;
