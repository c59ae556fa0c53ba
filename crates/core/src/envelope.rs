// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The CloudEvents-shaped envelope stored in every stigmergy event.
//!
//! The envelope's canonical serialization (keys sorted recursively, no
//! insignificant whitespace, UTF-8) is the identity of an event: its
//! SHA-256 is the `content_hash` the store dedups on. Any change to
//! `type` or `subject` yields a new hash.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// CloudEvents spec version carried on every envelope.
pub const SPEC_VERSION: &str = "1.0";

/// Content type carried on every envelope.
pub const DATA_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The canonical envelope written into `data_json`.
///
/// Field order here is irrelevant: hashing always goes through the
/// key-sorted canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub specversion: String,
    /// 32-hex lowercase random id.
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub subject: String,
    /// RFC 3339 UTC instant with offset.
    pub time: String,
    /// Duplicate of `time`. Legacy field, kept for wire compatibility.
    pub timestamp: String,
    pub datacontenttype: String,
    /// `00-<32hex>-<16hex>-01`
    pub traceparent: String,
    pub data: serde_json::Value,
}

impl Envelope {
    /// Build a new envelope with fresh id, time, and traceparent.
    pub fn new(event_type: &str, source: &str, subject: &str, data: serde_json::Value) -> Self {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false);
        let trace_id = random_hex32();
        let span_id = random_hex16();
        Self {
            specversion: SPEC_VERSION.to_string(),
            id: random_hex32(),
            event_type: event_type.to_string(),
            source: source.to_string(),
            subject: subject.to_string(),
            time: now.clone(),
            timestamp: now,
            datacontenttype: DATA_CONTENT_TYPE.to_string(),
            traceparent: format!("00-{trace_id}-{span_id}-01"),
            data,
        }
    }

    /// Canonical serialization: keys sorted recursively, compact, UTF-8,
    /// no trailing newline.
    ///
    /// `serde_json::Map` is a sorted map in this workspace (preserve_order
    /// is off), so round-tripping through `Value` sorts every object.
    pub fn canonical_json(&self) -> Result<String, EnvelopeError> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string(&value)?)
    }

    /// Lowercase hex SHA-256 of the canonical serialization.
    pub fn content_hash(&self) -> Result<String, EnvelopeError> {
        Ok(sha256_hex(self.canonical_json()?.as_bytes()))
    }
}

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Canonical key-sorted compact JSON for any serializable value.
pub fn canonical_json_of<T: Serialize>(value: &T) -> Result<String, EnvelopeError> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&value)?)
}

/// Random 32-hex lowercase string (128 bits).
pub fn random_hex32() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Random 16-hex lowercase string (64 bits).
pub fn random_hex16() -> String {
    let full = uuid::Uuid::new_v4().simple().to_string();
    full[..16].to_string()
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
