// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secondary (hosted) provider client.
//!
//! A plain JSON text endpoint behind an API key. Only constructed when
//! credentials are configured; callers treat `None` as NO_CREDENTIALS.

use crate::error::ModelError;
use crate::primary::Generated;
use serde_json::json;
use std::time::{Duration, Instant};

const DEFAULT_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct SecondaryClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl SecondaryClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ModelError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http: reqwest::Client::builder().build()?,
        })
    }

    /// Build from env; `None` when base URL or key is missing.
    pub fn from_env() -> Option<Self> {
        let base_url = hfo_core::env::secondary_base_url()?;
        let api_key = hfo_core::env::secondary_api_key()?;
        Self::new(&base_url, &api_key).ok()
    }

    /// Reachability + latency, for the AI probe dimension.
    pub async fn ping(&self) -> Result<f64, ModelError> {
        let started = Instant::now();
        let resp = self
            .http
            .get(format!("{}/v1/models", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_millis(5_000))
            .send()
            .await
            .map_err(|e| ModelError::from_reqwest(e, 5_000))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ModelError::from_status(status.as_u16()));
        }
        Ok(started.elapsed().as_secs_f64() * 1000.0)
    }

    /// Generate text from a prompt.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
    ) -> Result<Generated, ModelError> {
        let payload = json!({
            "model": model,
            "system": system,
            "prompt": prompt,
            "stream": false,
        });
        let started = Instant::now();
        let resp = self
            .http
            .post(format!("{}/v1/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .send()
            .await
            .map_err(|e| ModelError::from_reqwest(e, DEFAULT_TIMEOUT_MS))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ModelError::from_status(status.as_u16()));
        }
        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ModelError::Parse(e.to_string()))?;
        let text = value
            .get("text")
            .or_else(|| value.get("response"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| ModelError::Parse("missing text field".into()))?;
        Ok(Generated {
            text: text.trim().to_string(),
            latency_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }
}
