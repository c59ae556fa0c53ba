// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event publisher: wraps payloads into the canonical envelope,
//! hashes, and appends.
//!
//! The hash is the identity: a computed envelope is never mutated before
//! insertion, and a duplicate hash is treated as success (at-most-once
//! semantics by content).

use crate::error::StoreError;
use crate::ssot::Ssot;
use hfo_core::{Component, Envelope, EventType, FaultKind};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

/// Runtime-context block injected into event payloads that lack one.
#[derive(Debug, Clone, Serialize)]
pub struct SignalMeta {
    pub port: String,
    pub model: String,
    pub latency_ms: f64,
    pub tokens_out: i64,
}

/// Publisher identity: component + generation. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Publisher {
    source: String,
    generation: String,
}

impl Publisher {
    /// Publisher identity for a component: `hfo_<slug>_gen<G>`.
    pub fn for_component(component: Component, generation: &str) -> Self {
        Self {
            source: format!("hfo_{}_gen{generation}", component.source_slug()),
            generation: generation.to_string(),
        }
    }

    /// Publisher with an explicit source tag (tests, external tooling).
    pub fn with_source(source: &str, generation: &str) -> Self {
        Self {
            source: source.to_string(),
            generation: generation.to_string(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Publish an event. Returns the assigned row id (0 when deduped).
    pub fn publish(
        &self,
        ssot: &Ssot,
        event_type: &EventType,
        subject: &str,
        data: serde_json::Value,
    ) -> Result<i64, StoreError> {
        self.publish_raw(ssot, &event_type.render(&self.generation), subject, data)
    }

    /// Publish with a signal metadata block, unless the caller already
    /// set one.
    pub fn publish_with_signal(
        &self,
        ssot: &Ssot,
        event_type: &EventType,
        subject: &str,
        mut data: serde_json::Value,
        signal: &SignalMeta,
    ) -> Result<i64, StoreError> {
        if let serde_json::Value::Object(map) = &mut data {
            if !map.contains_key("signal") {
                map.insert("signal".to_string(), serde_json::to_value(signal)?);
            }
        }
        self.publish(ssot, event_type, subject, data)
    }

    /// Publish an error event carrying the fault taxonomy tag.
    pub fn publish_fault(
        &self,
        ssot: &Ssot,
        event_type: &EventType,
        subject: &str,
        kind: FaultKind,
        message: &str,
        detail: serde_json::Value,
    ) -> Result<i64, StoreError> {
        self.publish(
            ssot,
            event_type,
            subject,
            json!({
                "kind": kind,
                "message": message,
                "detail": detail,
            }),
        )
    }

    /// Publish with a pre-rendered type string.
    pub fn publish_raw(
        &self,
        ssot: &Ssot,
        rendered_type: &str,
        subject: &str,
        data: serde_json::Value,
    ) -> Result<i64, StoreError> {
        let envelope = Envelope::new(rendered_type, &self.source, subject, data);
        let content_hash = envelope.content_hash()?;
        let data_json = envelope.canonical_json()?;
        let id = ssot.append(
            rendered_type,
            &envelope.time,
            subject,
            &self.source,
            &data_json,
            &content_hash,
        )?;
        debug!(event_type = rendered_type, id, "published");
        Ok(id)
    }
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
