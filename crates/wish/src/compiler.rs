// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The compiler driver: runs passes in order, persists after each one,
//! and audits every transition on the trail.

use crate::passes;
use crate::predicates::PredicateRegistry;
use crate::state::{PassStatus, PipelineStatus, PipelineStore, WishPipeline};
use hfo_core::{Component, EventType, Paths};
use hfo_model::PrimaryClient;
use hfo_store::{Publisher, Ssot};
use serde_json::json;
use thiserror::Error;
use tracing::info;

const EVT_CREATED: EventType = EventType::new(Component::Wish, "pipeline.created");
const EVT_PASS1: EventType = EventType::new(Component::Wish, "pass1.scenarios");
const EVT_PASS2: EventType = EventType::new(Component::Wish, "pass2.cards");
const EVT_PASS3: EventType = EventType::new(Component::Wish, "pass3.predicates");
const EVT_PASS4: EventType = EventType::new(Component::Wish, "pass4.verdict");
const EVT_PASS5: EventType = EventType::new(Component::Wish, "pass5.artifact");
const EVT_GRANTED: EventType = EventType::new(Component::Wish, "pipeline.granted");
const EVT_REJECTED: EventType = EventType::new(Component::Wish, "pipeline.rejected");
const EVT_DENIED: EventType = EventType::new(Component::Wish, "pipeline.denied");

#[derive(Debug, Error)]
pub enum WishError {
    #[error("unknown wish id: {0}")]
    UnknownWish(String),

    #[error("cannot resume from pass {0}: valid range is 1-5")]
    BadResumePass(u8),

    #[error("state file error: {0}")]
    State(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] hfo_store::StoreError),
}

/// The five-pass compiler bound to one root.
pub struct Compiler {
    store: PipelineStore,
    ssot: Ssot,
    publisher: Publisher,
    primary: PrimaryClient,
    registry: PredicateRegistry,
    model: String,
    dry_run: bool,
    stop_after: Option<u8>,
}

impl Compiler {
    pub fn new(paths: &Paths, ssot: Ssot, dry_run: bool) -> Result<Self, WishError> {
        let generation = hfo_core::env::generation();
        Ok(Self {
            store: PipelineStore::new(paths.wish_state()),
            ssot,
            publisher: Publisher::for_component(Component::Wish, &generation),
            primary: PrimaryClient::from_env()
                .map_err(|e| WishError::State(std::io::Error::other(e.to_string())))?,
            registry: PredicateRegistry::new(),
            model: hfo_core::env::generate_model(),
            dry_run,
            stop_after: None,
        })
    }

    /// Stop the pipeline after the given pass (inclusive).
    pub fn stop_after(mut self, pass: Option<u8>) -> Self {
        self.stop_after = pass;
        self
    }

    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    pub fn ssot(&self) -> &Ssot {
        &self.ssot
    }

    /// Compile a fresh wish from an intent string.
    pub async fn compile(
        &mut self,
        intent_text: &str,
        context_doc_ids: Vec<i64>,
    ) -> Result<WishPipeline, WishError> {
        let pipeline = WishPipeline::new(intent_text, context_doc_ids);
        self.store.put(&pipeline)?;
        self.publish(
            &EVT_CREATED,
            &pipeline.wish_id,
            "CREATED",
            json!({"intent": intent_text}),
        )?;
        info!(wish_id = %pipeline.wish_id, "pipeline created");
        self.run_from(pipeline, 1).await
    }

    /// Re-enter a persisted pipeline at the requested pass.
    pub async fn resume(
        &mut self,
        wish_id: &str,
        from_pass: u8,
    ) -> Result<WishPipeline, WishError> {
        if !(1..=5).contains(&from_pass) {
            return Err(WishError::BadResumePass(from_pass));
        }
        let mut pipeline = self
            .store
            .get(wish_id)
            .ok_or_else(|| WishError::UnknownWish(wish_id.to_string()))?;

        // Passes 3 and 4 need the registry repopulated from persisted
        // cards; registration is idempotent.
        if from_pass >= 4 && !pipeline.task_cards.is_empty() {
            passes::run_pass_3(&mut pipeline, &mut self.registry);
        }
        self.run_from(pipeline, from_pass).await
    }

    pub fn status(&self, wish_id: &str) -> Result<WishPipeline, WishError> {
        self.store
            .get(wish_id)
            .ok_or_else(|| WishError::UnknownWish(wish_id.to_string()))
    }

    pub fn list(&self) -> Vec<WishPipeline> {
        self.store.list()
    }

    async fn run_from(
        &mut self,
        mut pipeline: WishPipeline,
        from_pass: u8,
    ) -> Result<WishPipeline, WishError> {
        for pass in from_pass..=5 {
            pipeline.current_pass = pass;
            pipeline.status = PipelineStatus::for_pass(pass);
            self.store.put(&pipeline)?;

            let result = match pass {
                1 => {
                    passes::run_pass_1(&mut pipeline, &self.primary, &self.model, self.dry_run)
                        .await
                }
                2 => passes::run_pass_2(&mut pipeline),
                3 => passes::run_pass_3(&mut pipeline, &mut self.registry),
                4 => passes::run_pass_4(&pipeline, &self.registry, &self.ssot),
                _ => passes::run_pass_5(&mut pipeline),
            };

            let event_type = match pass {
                1 => &EVT_PASS1,
                2 => &EVT_PASS2,
                3 => &EVT_PASS3,
                4 => &EVT_PASS4,
                _ => &EVT_PASS5,
            };
            self.publish(
                event_type,
                &pipeline.wish_id,
                &format!("PASS_{pass}:{:?}", result.status),
                result.data.clone(),
            )?;

            let status = result.status;
            pipeline.record_pass(result);

            match status {
                PassStatus::Ok => {}
                PassStatus::Rejected => {
                    pipeline.status = PipelineStatus::Rejected;
                    self.store.put(&pipeline)?;
                    self.publish(&EVT_REJECTED, &pipeline.wish_id, "REJECTED", json!({"pass": pass}))?;
                    return Ok(pipeline);
                }
                PassStatus::Denied => {
                    pipeline.status = PipelineStatus::Denied;
                    self.store.put(&pipeline)?;
                    self.publish(&EVT_DENIED, &pipeline.wish_id, "DENIED", json!({"pass": pass}))?;
                    return Ok(pipeline);
                }
            }
            self.store.put(&pipeline)?;

            if self.stop_after == Some(pass) {
                return Ok(pipeline);
            }
        }

        pipeline.status = PipelineStatus::Granted;
        self.store.put(&pipeline)?;
        self.publish(
            &EVT_GRANTED,
            &pipeline.wish_id,
            "GRANTED",
            json!({"artifacts": pipeline.artifacts}),
        )?;
        info!(wish_id = %pipeline.wish_id, "wish granted");
        Ok(pipeline)
    }

    fn publish(
        &self,
        event_type: &EventType,
        wish_id: &str,
        tag: &str,
        data: serde_json::Value,
    ) -> Result<i64, WishError> {
        Ok(self.publisher.publish(
            &self.ssot,
            event_type,
            &format!("WISH:{wish_id}:{tag}"),
            data,
        )?)
    }
}

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;
