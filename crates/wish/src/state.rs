// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline state, persisted after every pass and retained for audit.

use chrono::{SecondsFormat, Utc};
use hfo_core::envelope::random_hex16;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;

/// Pipeline status flow:
/// CREATED -> PASS_1 .. PASS_5 -> GRANTED, with REJECTED/DENIED exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    #[serde(rename = "CREATED")]
    Created,
    #[serde(rename = "PASS_1")]
    Pass1,
    #[serde(rename = "PASS_2")]
    Pass2,
    #[serde(rename = "PASS_3")]
    Pass3,
    #[serde(rename = "PASS_4")]
    Pass4,
    #[serde(rename = "PASS_5")]
    Pass5,
    #[serde(rename = "GRANTED")]
    Granted,
    #[serde(rename = "DENIED")]
    Denied,
    #[serde(rename = "REJECTED")]
    Rejected,
    #[serde(rename = "ARCHIVED")]
    Archived,
}

impl PipelineStatus {
    pub fn for_pass(pass: u8) -> Self {
        match pass {
            1 => PipelineStatus::Pass1,
            2 => PipelineStatus::Pass2,
            3 => PipelineStatus::Pass3,
            4 => PipelineStatus::Pass4,
            _ => PipelineStatus::Pass5,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineStatus::Granted
                | PipelineStatus::Denied
                | PipelineStatus::Rejected
                | PipelineStatus::Archived
        )
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PipelineStatus::Created => "CREATED",
            PipelineStatus::Pass1 => "PASS_1",
            PipelineStatus::Pass2 => "PASS_2",
            PipelineStatus::Pass3 => "PASS_3",
            PipelineStatus::Pass4 => "PASS_4",
            PipelineStatus::Pass5 => "PASS_5",
            PipelineStatus::Granted => "GRANTED",
            PipelineStatus::Denied => "DENIED",
            PipelineStatus::Rejected => "REJECTED",
            PipelineStatus::Archived => "ARCHIVED",
        };
        write!(f, "{tag}")
    }
}

/// Status of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassStatus {
    Ok,
    Rejected,
    Denied,
}

/// Result of a single compiler pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassResult {
    pub pass_number: u8,
    pub status: PassStatus,
    pub data: serde_json::Value,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PassResult {
    pub fn ok(pass_number: u8, data: serde_json::Value) -> Self {
        Self {
            pass_number,
            status: PassStatus::Ok,
            data,
            timestamp: now(),
            error: None,
        }
    }

    pub fn rejected(pass_number: u8, error: &str) -> Self {
        Self {
            pass_number,
            status: PassStatus::Rejected,
            data: serde_json::json!({"error": error}),
            timestamp: now(),
            error: Some(error.to_string()),
        }
    }

    pub fn denied(pass_number: u8, data: serde_json::Value, error: &str) -> Self {
        Self {
            pass_number,
            status: PassStatus::Denied,
            data,
            timestamp: now(),
            error: Some(error.to_string()),
        }
    }
}

/// One extracted scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCard {
    pub task_id: String,
    pub scenario_name: String,
    pub precondition: String,
    pub trigger: String,
    pub outcome: String,
    #[serde(default)]
    pub port_mapping: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_artifact: Option<String>,
}

/// One wish moving through the compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishPipeline {
    pub wish_id: String,
    pub intent_text: String,
    #[serde(default)]
    pub context_doc_ids: Vec<i64>,
    pub current_pass: u8,
    pub status: PipelineStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub pass_results: BTreeMap<String, PassResult>,
    #[serde(default)]
    pub feature_content: String,
    #[serde(default)]
    pub task_cards: Vec<TaskCard>,
    #[serde(default)]
    pub predicate_names: Vec<String>,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub error_log: Vec<String>,
}

impl WishPipeline {
    pub fn new(intent_text: &str, context_doc_ids: Vec<i64>) -> Self {
        let stamp = now();
        Self {
            wish_id: random_hex16()[..8].to_uppercase(),
            intent_text: intent_text.to_string(),
            context_doc_ids,
            current_pass: 0,
            status: PipelineStatus::Created,
            created_at: stamp.clone(),
            updated_at: stamp,
            pass_results: BTreeMap::new(),
            feature_content: String::new(),
            task_cards: Vec::new(),
            predicate_names: Vec::new(),
            artifacts: Vec::new(),
            error_log: Vec::new(),
        }
    }

    pub fn record_pass(&mut self, result: PassResult) {
        if let Some(error) = &result.error {
            self.error_log.push(format!("pass {}: {error}", result.pass_number));
        }
        self.pass_results
            .insert(result.pass_number.to_string(), result);
        self.updated_at = now();
    }
}

/// The state file holding every pipeline, past and present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    pipelines: BTreeMap<String, WishPipeline>,
    #[serde(default)]
    last_updated: Option<String>,
}

/// Pipeline persistence. Single-writer; atomic temp+rename saves.
pub struct PipelineStore {
    path: PathBuf,
}

impl PipelineStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn get(&self, wish_id: &str) -> Option<WishPipeline> {
        self.load().pipelines.get(wish_id).cloned()
    }

    pub fn list(&self) -> Vec<WishPipeline> {
        let mut pipelines: Vec<_> = self.load().pipelines.into_values().collect();
        pipelines.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pipelines
    }

    pub fn put(&self, pipeline: &WishPipeline) -> Result<(), std::io::Error> {
        let mut state = self.load();
        state
            .pipelines
            .insert(pipeline.wish_id.clone(), pipeline.clone());
        state.last_updated = Some(now());
        self.save(&state)
    }

    fn load(&self) -> StateFile {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    fn save(&self, state: &StateFile) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let tmp = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
