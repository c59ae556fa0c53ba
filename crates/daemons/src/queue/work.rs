// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-item processing for both lanes.

use super::item::{Lane, Work, WorkItem, WorkResult, WorkStatus};
use hfo_core::envelope::sha256_hex;
use hfo_model::{GenerateRequest, PrimaryClient};
use hfo_store::{cosine_similarity, Ssot};
use hfo_worker::WorkerError;
use serde_json::json;
use std::time::{Duration, Instant};

const STUB_EMBED_DIM: usize = 8;

/// Process one item. Failures become `WorkStatus::Error` results, never
/// panics or lane exits.
pub(super) async fn process(
    item: &WorkItem,
    lane: Lane,
    ssot: &Ssot,
    primary: &PrimaryClient,
    dry_run: bool,
) -> WorkResult {
    let started = Instant::now();
    let outcome = run_work(&item.work, ssot, primary, dry_run).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    match outcome {
        Ok(output) => WorkResult {
            id: item.id.clone(),
            lane,
            status: WorkStatus::Completed,
            elapsed_ms,
            output: Some(output),
            error: None,
        },
        Err(err) => WorkResult {
            id: item.id.clone(),
            lane,
            status: WorkStatus::Error,
            elapsed_ms,
            output: None,
            error: Some(err.to_string()),
        },
    }
}

async fn run_work(
    work: &Work,
    ssot: &Ssot,
    primary: &PrimaryClient,
    dry_run: bool,
) -> Result<serde_json::Value, WorkerError> {
    match work {
        Work::EmbedBatch { batch_size } => {
            let ids = ssot.docs_without_embedding(*batch_size)?;
            let model = hfo_core::env::embed_model();
            let mut embedded = Vec::new();
            for id in ids {
                let Some(doc) = ssot.get_document(id)? else {
                    continue;
                };
                let text = format!("{}\n{}", doc.title, doc.content);
                let vector = if dry_run {
                    stub_embedding(&text)
                } else {
                    primary.embed(&model, &text).await?
                };
                ssot.upsert_embedding(id, &model, &vector)?;
                embedded.push(id);
            }
            Ok(json!({"embedded": embedded}))
        }
        Work::EmbedSearch { query, top_k } => {
            let model = hfo_core::env::embed_model();
            let query_vector = if dry_run {
                stub_embedding(query)
            } else {
                primary.embed(&model, query).await?
            };
            let mut scored: Vec<(i64, f32)> = ssot
                .all_embeddings(1000)?
                .into_iter()
                .map(|(id, vector)| (id, cosine_similarity(&query_vector, &vector)))
                .collect();
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(*top_k);
            let hits: Vec<_> = scored
                .into_iter()
                .map(|(id, score)| json!({"doc_id": id, "score": score}))
                .collect();
            Ok(json!({"hits": hits}))
        }
        Work::Generate { prompt, model } => {
            if dry_run {
                let preview: String = prompt.chars().take(60).collect();
                return Ok(json!({"text": format!("[dry-run] {preview}")}));
            }
            let model = model.clone().unwrap_or_else(hfo_core::env::generate_model);
            let request = GenerateRequest::new(&model, prompt)
                .deadline(Duration::from_secs(120))
                .num_predict(1024);
            let generated = primary.generate(&request).await?;
            Ok(json!({"text": generated.text, "latency_ms": generated.latency_ms}))
        }
        Work::Summarize { doc_id } => {
            let doc = require_doc(ssot, *doc_id)?;
            let bluf = if dry_run {
                doc.content.chars().take(120).collect::<String>()
            } else {
                let request = GenerateRequest::new(
                    &hfo_core::env::generate_model(),
                    &format!("Summarize in two sentences:\n{}", doc.content),
                )
                .num_predict(160)
                .deadline(Duration::from_secs(90));
                primary.generate(&request).await?.text
            };
            ssot.update_bluf(*doc_id, &bluf)?;
            Ok(json!({"doc_id": doc_id, "bluf_len": bluf.len()}))
        }
        Work::Classify { doc_id } => {
            let doc = require_doc(ssot, *doc_id)?;
            let label = if dry_run {
                "note".to_string()
            } else {
                let request = GenerateRequest::new(
                    &hfo_core::env::generate_model(),
                    &format!(
                        "Classify this document as one of: note, report, spec, log.\n\
                         Respond with the single label only.\n\n{}",
                        doc.content
                    ),
                )
                .num_predict(8)
                .deadline(Duration::from_secs(60));
                primary.generate(&request).await?.text.to_lowercase()
            };
            Ok(json!({"doc_id": doc_id, "doc_type": label.trim()}))
        }
        Work::Evaluate { doc_id } => {
            let doc = require_doc(ssot, *doc_id)?;
            let score = if dry_run {
                // Rough length-based placeholder score.
                (doc.word_count.min(2000) as f64 / 200.0).clamp(1.0, 10.0)
            } else {
                let request = GenerateRequest::new(
                    &hfo_core::env::generate_model(),
                    &format!(
                        "Rate the substance of this document 1-10. Respond with the \
                         number only.\n\n{}",
                        doc.content
                    ),
                )
                .num_predict(4)
                .deadline(Duration::from_secs(60));
                primary
                    .generate(&request)
                    .await?
                    .text
                    .trim()
                    .parse::<f64>()
                    .unwrap_or(5.0)
            };
            Ok(json!({"doc_id": doc_id, "score": score}))
        }
    }
}

fn require_doc(ssot: &Ssot, doc_id: i64) -> Result<hfo_store::Document, WorkerError> {
    ssot.get_document(doc_id)?.ok_or_else(|| {
        WorkerError::new(
            hfo_core::FaultKind::ValidationFailed,
            format!("document {doc_id} not found"),
        )
    })
}

/// Deterministic pseudo-embedding for dry runs: content-hash bytes
/// scaled into [0, 1).
fn stub_embedding(text: &str) -> Vec<f32> {
    let hash = sha256_hex(text.as_bytes());
    hash.as_bytes()
        .chunks(8)
        .take(STUB_EMBED_DIM)
        .map(|chunk| {
            let sum: u32 = chunk.iter().map(|&b| b as u32).sum();
            (sum % 997) as f32 / 997.0
        })
        .collect()
}
