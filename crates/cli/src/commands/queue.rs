// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compute queue verbs: submit work, drain, report.

use crate::cli::QueueVerb;
use crate::exit_error::ExitError;
use crate::output::print_json;
use hfo_core::Component;
use hfo_daemons::{ComputeQueue, QueueDeps, Work, WorkStatus};
use hfo_store::Publisher;

fn deps(dry_run: bool) -> Result<QueueDeps, ExitError> {
    let paths = super::fabric_paths();
    // Make sure the store exists before lanes open their own handles.
    super::open_ssot(&paths)?;
    Ok(QueueDeps {
        db_path: paths.ssot_db(),
        publisher: Publisher::for_component(Component::ComputeQueue, &hfo_core::env::generation()),
        dry_run,
    })
}

pub async fn handle(verb: QueueVerb, json: bool) -> Result<(), ExitError> {
    match verb {
        QueueVerb::Status => {
            let paths = super::fabric_paths();
            let ssot = super::open_ssot(&paths)?;
            let stats = ssot.stats()?;
            let completed = ssot.count_by_pattern("%compute_queue.completed", 24 * 60)?;
            let errored = ssot.count_by_pattern("%compute_queue.error", 24 * 60)?;
            let summary = serde_json::json!({
                "doc_count": stats.doc_count,
                "event_count": stats.event_count,
                "embedding_count": ssot.embedding_count()?,
                "completed_24h": completed,
                "errored_24h": errored,
            });
            if json {
                return print_json(&summary);
            }
            println!(
                "docs={} embeddings={} completed_24h={completed} errored_24h={errored}",
                stats.doc_count,
                ssot.embedding_count()?,
            );
            Ok(())
        }
        QueueVerb::EmbedAll {
            batch_size,
            dry_run,
        } => {
            let deps = deps(dry_run)?;
            let queue = ComputeQueue::new();
            queue.submit(5, Work::EmbedBatch { batch_size });
            let results = queue.run(&deps, true).await?;
            finish(results, json)
        }
        QueueVerb::Enrich {
            task,
            model,
            limit,
            dry_run,
        } => {
            let deps = deps(dry_run)?;
            let paths = super::fabric_paths();
            let ssot = super::open_ssot(&paths)?;
            let doc_ids = ssot.random_doc_ids(limit)?;
            if doc_ids.is_empty() {
                return Err(ExitError::domain("no documents to enrich"));
            }
            let queue = ComputeQueue::new();
            for doc_id in doc_ids {
                let work = match task.as_str() {
                    "summarize" => Work::Summarize { doc_id },
                    "classify" => Work::Classify { doc_id },
                    "evaluate" => Work::Evaluate { doc_id },
                    other => {
                        return Err(ExitError::new(2, format!("unknown task: {other}")));
                    }
                };
                queue.submit(5, work);
            }
            if let Some(model) = model {
                std::env::set_var("HFO_GENERATE_MODEL", model);
            }
            let results = queue.run(&deps, true).await?;
            finish(results, json)
        }
        QueueVerb::Search {
            query,
            limit,
            dry_run,
        } => {
            let deps = deps(dry_run)?;
            let queue = ComputeQueue::new();
            queue.submit(
                1,
                Work::EmbedSearch {
                    query,
                    top_k: limit,
                },
            );
            let results = queue.run(&deps, true).await?;
            if json {
                return print_json(&results);
            }
            for result in &results {
                if let Some(hits) = result.output.as_ref().and_then(|o| o.get("hits")) {
                    for hit in hits.as_array().into_iter().flatten() {
                        println!(
                            "doc {} score {:.3}",
                            hit.get("doc_id").and_then(|v| v.as_i64()).unwrap_or(0),
                            hit.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0),
                        );
                    }
                }
            }
            Ok(())
        }
    }
}

fn finish(results: Vec<hfo_daemons::WorkResult>, json: bool) -> Result<(), ExitError> {
    let errored = results.iter().filter(|r| r.status == WorkStatus::Error).count();
    if json {
        print_json(&results)?;
    } else {
        println!("{} item(s), {} errored", results.len(), errored);
    }
    if errored > 0 {
        return Err(ExitError::silent(1));
    }
    Ok(())
}
