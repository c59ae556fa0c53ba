// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline compiler verbs.

use crate::cli::WishVerb;
use crate::exit_error::ExitError;
use crate::output::print_json;
use hfo_wish::{Compiler, PipelineStatus, WishPipeline};

fn open_compiler(dry_run: bool) -> Result<Compiler, ExitError> {
    let paths = super::fabric_paths();
    let ssot = super::open_ssot(&paths)?;
    Ok(Compiler::new(&paths, ssot, dry_run)?)
}

pub async fn handle(verb: WishVerb, json: bool) -> Result<(), ExitError> {
    match verb {
        WishVerb::Compile {
            intent,
            dry_run,
            stop_after,
            context_docs,
        } => {
            let mut compiler = open_compiler(dry_run)?.stop_after(stop_after);
            let pipeline = compiler.compile(&intent, context_docs).await?;
            report(pipeline, json)
        }
        WishVerb::Pass1 { intent, dry_run } => {
            let mut compiler = open_compiler(dry_run)?.stop_after(Some(1));
            let pipeline = compiler.compile(&intent, vec![]).await?;
            report(pipeline, json)
        }
        WishVerb::Resume {
            wish_id,
            from_pass,
            dry_run,
        } => {
            let mut compiler = open_compiler(dry_run)?;
            let pipeline = compiler.resume(&wish_id, from_pass).await?;
            report(pipeline, json)
        }
        WishVerb::Status { wish_id } => {
            let compiler = open_compiler(true)?;
            let pipeline = compiler.status(&wish_id)?;
            if json {
                print_json(&pipeline)
            } else {
                println!(
                    "{} {} pass={} \"{}\"",
                    pipeline.wish_id, pipeline.status, pipeline.current_pass, pipeline.intent_text
                );
                for (pass, result) in &pipeline.pass_results {
                    println!("  pass {pass}: {:?}", result.status);
                }
                Ok(())
            }
        }
        WishVerb::List => {
            let compiler = open_compiler(true)?;
            let pipelines = compiler.list();
            if json {
                print_json(&pipelines)
            } else {
                for pipeline in &pipelines {
                    println!(
                        "{} {:<9} {}",
                        pipeline.wish_id, pipeline.status.to_string(), pipeline.intent_text
                    );
                }
                Ok(())
            }
        }
    }
}

fn report(pipeline: WishPipeline, json: bool) -> Result<(), ExitError> {
    let status = pipeline.status;
    if json {
        print_json(&pipeline)?;
    } else {
        println!("{} {}", pipeline.wish_id, status);
        if let Some(last_error) = pipeline.error_log.last() {
            println!("  {last_error}");
        }
    }
    match status {
        PipelineStatus::Rejected | PipelineStatus::Denied => Err(ExitError::silent(1)),
        _ => Ok(()),
    }
}
