// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The P4 song prospector: mines the document corpus for novel
//! structured proposals.
//!
//! A persisted considered-set keeps documents from being mined twice;
//! the prompt carries every already-known name so the model cannot
//! re-propose them; validation is strict and session-deduplicated.

use crate::singer;
use async_trait::async_trait;
use hfo_core::{Component, EventType, Paths};
use hfo_model::{extract_json_array, GenerateRequest};
use hfo_worker::{CycleReport, Worker, WorkerContext, WorkerError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

const EVT_PROPOSAL: EventType = EventType::new(Component::Prospector, "proposal");
const EVT_PASS_COMPLETE: EventType = EventType::new(Component::Prospector, "pass_complete");

const MIN_DOC_WORDS: i64 = 200;
const DEFAULT_BATCH_SIZE: i64 = 3;
const DEFAULT_MIN_CONFIDENCE: i64 = 5;
const BASE_TEMPERATURE: f64 = 0.7;
const TEMPERATURE_STEP: f64 = 0.1;
const MAX_TEMPERATURE: f64 = 1.0;
const MIN_TEMPERATURE: f64 = 0.3;

const SYSTEM_PROMPT: &str = "You read documents from a knowledge system and identify patterns \
worth recording. Strife patterns warn of failures and antipatterns; splendor patterns \
celebrate proven architectures and hard-won wisdom. Respond ONLY with a JSON array of \
proposal objects with keys: song_type (strife|splendor), spell_name (UPPER_SNAKE_CASE), \
subtitle, pattern_description, evidence_quote, suggested_genre, confidence (1-10). \
Return [] when nothing stands out.";

/// Persisted prospector state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProspectorState {
    #[serde(default)]
    pub prospected_ids: BTreeSet<i64>,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    #[serde(default)]
    pub saved_at: Option<String>,
}

impl ProspectorState {
    pub fn load(paths: &Paths) -> Self {
        let path = paths.prospector_state();
        let mut state: Self = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        if state.temperature == 0.0 {
            state.temperature = BASE_TEMPERATURE;
        }
        state
    }

    pub fn save(&mut self, paths: &Paths) -> Result<(), WorkerError> {
        self.saved_at = Some(
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, false),
        );
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| WorkerError::internal(e.to_string()))?;
        let path = paths.prospector_state();
        let tmp = path.with_extension("json.tmp");
        let write = || -> std::io::Result<()> {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            std::fs::rename(&tmp, &path)
        };
        write().map_err(|e| WorkerError::internal(e.to_string()))
    }
}

/// A validated proposal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Proposal {
    pub song_type: String,
    pub spell_name: String,
    pub subtitle: String,
    pub pattern_description: String,
    pub evidence_quote: String,
    pub suggested_genre: String,
    pub confidence: i64,
}

/// Validate and normalize a raw model proposal.
///
/// `None` when the proposal is malformed, below the confidence floor,
/// already known, or already proposed this session.
pub fn validate_proposal(
    raw: &serde_json::Value,
    min_confidence: i64,
    known_names: &[String],
    session: &mut HashSet<String>,
) -> Option<Proposal> {
    let song_type = raw.get("song_type")?.as_str()?.to_lowercase();
    if song_type != "strife" && song_type != "splendor" {
        return None;
    }

    let spell_name = raw
        .get("spell_name")?
        .as_str()?
        .trim()
        .to_uppercase()
        .replace(' ', "_");
    if spell_name.is_empty() {
        return None;
    }
    if known_names.iter().any(|k| k == &spell_name) {
        return None;
    }

    let dedup_key = format!("{song_type}:{spell_name}");
    if session.contains(&dedup_key) {
        return None;
    }

    let confidence = match raw.get("confidence") {
        Some(serde_json::Value::Number(n)) => n.as_i64().unwrap_or(5),
        Some(serde_json::Value::String(s)) => s.parse().unwrap_or(5),
        _ => 5,
    };
    if confidence < min_confidence {
        return None;
    }

    session.insert(dedup_key);
    Some(Proposal {
        song_type,
        spell_name,
        subtitle: truncate(raw.get("subtitle").and_then(|v| v.as_str()).unwrap_or("Unnamed Pattern"), 100),
        pattern_description: truncate(
            raw.get("pattern_description").and_then(|v| v.as_str()).unwrap_or(""),
            500,
        ),
        evidence_quote: truncate(
            raw.get("evidence_quote").and_then(|v| v.as_str()).unwrap_or(""),
            500,
        ),
        suggested_genre: truncate(
            raw.get("suggested_genre").and_then(|v| v.as_str()).unwrap_or("Unknown"),
            50,
        ),
        confidence: confidence.clamp(1, 10),
    })
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Advance the sampling temperature after a full pass; wraps back down
/// instead of saturating.
pub fn next_temperature(current: f64) -> f64 {
    let next = current + TEMPERATURE_STEP;
    if next > MAX_TEMPERATURE + f64::EPSILON {
        MIN_TEMPERATURE
    } else {
        (next * 10.0).round() / 10.0
    }
}

/// The prospector daemon.
pub struct ProspectorDaemon {
    state: ProspectorState,
    batch_size: i64,
    min_confidence: i64,
    model: String,
    session_proposals: HashSet<String>,
    known_names: Vec<String>,
    state_loaded: bool,
}

impl ProspectorDaemon {
    pub fn new() -> Self {
        // The singer's archetype registries are the already-known names.
        let mut known: BTreeSet<String> = singer::STRIFE_PATTERNS
            .iter()
            .map(|p| singer::strife_archetype(p).to_string())
            .collect();
        known.extend(
            singer::SPLENDOR_PATTERNS
                .iter()
                .map(|p| singer::splendor_archetype(p).to_string()),
        );
        let known_names = known.into_iter().collect();

        Self {
            state: ProspectorState::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            model: hfo_core::env::generate_model(),
            session_proposals: HashSet::new(),
            known_names,
            state_loaded: false,
        }
    }

    pub fn batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn state(&self) -> &ProspectorState {
        &self.state
    }

    fn compose_prompt(&self, doc: &hfo_store::Document) -> String {
        let known = self.known_names.join(", ");
        format!(
            "Analyze this document for patterns worth proposing.\n\n\
             DOCUMENT ID: {}\nTITLE: {}\nSOURCE: {}\nPORT: {}\nWORD COUNT: {}\n\n\
             SUMMARY: {}\n\nCONTENT (preview):\n{}\n\n---\n\n\
             NAMES ALREADY TAKEN (do NOT re-propose): {}\n\n\
             Respond with a JSON array of proposals. Empty array [] if nothing stands out.",
            doc.id, doc.title, doc.source, doc.port, doc.word_count, doc.bluf, doc.content, known
        )
    }
}

impl Default for ProspectorDaemon {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for ProspectorDaemon {
    fn key(&self) -> &str {
        "prospector"
    }

    fn component(&self) -> Component {
        Component::Prospector
    }

    async fn run_cycle(&mut self, cx: &mut WorkerContext) -> Result<CycleReport, WorkerError> {
        if !self.state_loaded {
            self.state = ProspectorState::load(&cx.paths);
            self.state_loaded = true;
        }

        let candidates =
            cx.ssot
                .sample_unconsidered(&self.state.prospected_ids, MIN_DOC_WORDS, self.batch_size)?;

        // Full pass: start over at a slightly different temperature.
        if candidates.is_empty() {
            let considered = self.state.prospected_ids.len();
            if considered == 0 {
                return Ok(CycleReport::default().note("corpus empty"));
            }
            let old_temperature = self.state.temperature;
            self.state.temperature = next_temperature(old_temperature);
            self.state.prospected_ids.clear();
            *self.state.stats.entry("passes_completed".into()).or_insert(0) += 1;
            self.state.save(&cx.paths)?;
            if !cx.dry_run {
                cx.publisher.publish(
                    &cx.ssot,
                    &EVT_PASS_COMPLETE,
                    &format!("PASS_COMPLETE:{considered}_docs"),
                    json!({
                        "docs_considered": considered,
                        "old_temperature": old_temperature,
                        "new_temperature": self.state.temperature,
                    }),
                )?;
            }
            info!(considered, "prospecting pass complete");
            return Ok(CycleReport::default().tally("passes_completed", 1));
        }

        let mut docs_mined = 0i64;
        let mut proposals_sung = 0i64;
        let mut parse_failures = 0i64;

        for doc in candidates {
            self.state.prospected_ids.insert(doc.id);
            docs_mined += 1;
            *self.state.stats.entry("docs_prospected".into()).or_insert(0) += 1;

            if cx.dry_run {
                continue;
            }

            let prompt = self.compose_prompt(&doc);
            let request = GenerateRequest::new(&self.model, &prompt)
                .system(SYSTEM_PROMPT)
                .temperature(self.state.temperature)
                .num_predict(2048)
                .deadline(Duration::from_secs(120));
            let generated = cx.primary.generate(&request).await?;
            *self.state.stats.entry("model_calls".into()).or_insert(0) += 1;

            let raw_proposals = extract_json_array(&generated.text);
            if raw_proposals.is_empty() && !generated.text.trim().starts_with("[]") {
                parse_failures += 1;
            }

            for raw in &raw_proposals {
                let Some(proposal) = validate_proposal(
                    raw,
                    self.min_confidence,
                    &self.known_names,
                    &mut self.session_proposals,
                ) else {
                    continue;
                };
                cx.publisher.publish(
                    &cx.ssot,
                    &EVT_PROPOSAL,
                    &format!(
                        "PROPOSAL:{}:{}",
                        proposal.song_type.to_uppercase(),
                        proposal.spell_name
                    ),
                    json!({
                        "song_type": proposal.song_type,
                        "spell_name": proposal.spell_name,
                        "subtitle": proposal.subtitle,
                        "pattern_description": proposal.pattern_description,
                        "evidence_quote": proposal.evidence_quote,
                        "suggested_genre": proposal.suggested_genre,
                        "confidence": proposal.confidence,
                        "source_doc_id": doc.id,
                        "source_doc_title": truncate(&doc.title, 100),
                        "model": self.model,
                    }),
                )?;
                proposals_sung += 1;
                *self.state.stats.entry("proposals_generated".into()).or_insert(0) += 1;
            }
            debug!(doc = doc.id, proposals = raw_proposals.len(), "prospected");
        }

        self.state.save(&cx.paths)?;

        Ok(CycleReport::default()
            .tally("docs_prospected", docs_mined)
            .tally("proposals_sung", proposals_sung)
            .tally("parse_failures", parse_failures))
    }
}

#[cfg(test)]
#[path = "prospector_tests.rs"]
mod tests;
