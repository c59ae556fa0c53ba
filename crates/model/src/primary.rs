// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Primary (local, Ollama-compatible) provider client.

use crate::error::ModelError;
use crate::text::strip_think_tags;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

const ALIVE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_GENERATE_TIMEOUT_MS: u64 = 120_000;
const DEFAULT_EMBED_TIMEOUT_MS: u64 = 30_000;

/// A model currently resident in provider memory.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedModel {
    pub name: String,
    pub vram_gb: f64,
}

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub system: String,
    pub temperature: f64,
    pub num_predict: i64,
    pub deadline: Duration,
}

impl GenerateRequest {
    pub fn new(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.to_string(),
            system: String::new(),
            temperature: 0.3,
            num_predict: 512,
            deadline: Duration::from_millis(DEFAULT_GENERATE_TIMEOUT_MS),
        }
    }

    pub fn system(mut self, system: &str) -> Self {
        self.system = system.to_string();
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn num_predict(mut self, num_predict: i64) -> Self {
        self.num_predict = num_predict;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Generation result with observed latency.
#[derive(Debug, Clone)]
pub struct Generated {
    pub text: String,
    pub latency_ms: f64,
}

/// Client for the primary provider.
#[derive(Debug, Clone)]
pub struct PrimaryClient {
    base_url: String,
    http: reqwest::Client,
}

impl PrimaryClient {
    pub fn new(base_url: &str) -> Result<Self, ModelError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::builder().build()?,
        })
    }

    /// Client pointed at `OLLAMA_HOST` (or the local default).
    pub fn from_env() -> Result<Self, ModelError> {
        Self::new(&hfo_core::env::primary_base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Quick reachability check.
    pub async fn is_alive(&self) -> bool {
        self.tags().await.is_ok()
    }

    /// Installed model names.
    pub async fn tags(&self) -> Result<Vec<String>, ModelError> {
        let value = self.get_json("/api/tags", ALIVE_TIMEOUT_MS).await?;
        let models = value
            .get("models")
            .and_then(|m| m.as_array())
            .ok_or_else(|| ModelError::Parse("missing models array".into()))?;
        Ok(models
            .iter()
            .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
            .map(str::to_string)
            .collect())
    }

    /// Whether a model id (or prefix) is installed.
    pub async fn has_model(&self, model: &str) -> Result<bool, ModelError> {
        Ok(self.tags().await?.iter().any(|name| name.contains(model)))
    }

    /// Models currently loaded in memory, with their memory footprint.
    pub async fn ps(&self) -> Result<Vec<LoadedModel>, ModelError> {
        let value = self.get_json("/api/ps", ALIVE_TIMEOUT_MS).await?;
        let models = value
            .get("models")
            .and_then(|m| m.as_array())
            .ok_or_else(|| ModelError::Parse("missing models array".into()))?;
        Ok(models
            .iter()
            .filter_map(|m| {
                let name = m.get("name").and_then(|n| n.as_str())?;
                let bytes = m
                    .get("size_vram")
                    .or_else(|| m.get("size"))
                    .and_then(|s| s.as_f64())
                    .unwrap_or(0.0);
                Some(LoadedModel {
                    name: name.to_string(),
                    vram_gb: bytes / 1e9,
                })
            })
            .collect())
    }

    /// Generate text. Reasoning think-tags are stripped from the output.
    pub async fn generate(&self, req: &GenerateRequest) -> Result<Generated, ModelError> {
        let deadline_ms = req.deadline.as_millis() as u64;
        let mut payload = json!({
            "model": req.model,
            "prompt": req.prompt,
            "stream": false,
            "options": {"temperature": req.temperature, "num_predict": req.num_predict},
        });
        if !req.system.is_empty() {
            payload["system"] = json!(req.system);
        }

        let started = Instant::now();
        let value = self
            .post_json("/api/generate", &payload, deadline_ms)
            .await?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let text = value
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or_else(|| ModelError::Parse("missing response field".into()))?;
        debug!(model = %req.model, latency_ms, "generate ok");
        Ok(Generated {
            text: strip_think_tags(text).trim().to_string(),
            latency_ms,
        })
    }

    /// Embed a text with the given embedding model.
    pub async fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, ModelError> {
        let payload = json!({"model": model, "prompt": input});
        let value = self
            .post_json("/api/embeddings", &payload, DEFAULT_EMBED_TIMEOUT_MS)
            .await?;
        let embedding = value
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| ModelError::Parse("missing embedding field".into()))?;
        Ok(embedding
            .iter()
            .filter_map(|v| v.as_f64())
            .map(|v| v as f32)
            .collect())
    }

    async fn get_json(&self, route: &str, deadline_ms: u64) -> Result<Value, ModelError> {
        let url = format!("{}{route}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .timeout(Duration::from_millis(deadline_ms))
            .send()
            .await
            .map_err(|e| ModelError::from_reqwest(e, deadline_ms))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ModelError::from_status(status.as_u16()));
        }
        resp.json().await.map_err(|e| ModelError::Parse(e.to_string()))
    }

    async fn post_json(
        &self,
        route: &str,
        payload: &Value,
        deadline_ms: u64,
    ) -> Result<Value, ModelError> {
        let url = format!("{}{route}", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(payload)
            .timeout(Duration::from_millis(deadline_ms))
            .send()
            .await
            .map_err(|e| ModelError::from_reqwest(e, deadline_ms))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ModelError::from_status(status.as_u16()));
        }
        resp.json().await.map_err(|e| ModelError::Parse(e.to_string()))
    }
}

#[cfg(test)]
#[path = "primary_tests.rs"]
mod tests;
