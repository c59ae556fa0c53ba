// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The clap command tree (§ CLI surface).

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hfo", version, about = "Multi-daemon orchestration fabric")]
pub struct Cli {
    /// Machine-readable output on stdout, human formatting suppressed.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Preflight and launch a daemon as a background process
    Summon {
        /// Daemon key from the registry
        daemon_key: String,
        /// Banish any live instance first
        #[arg(long)]
        force: bool,
        /// Show the command line and preflight result without spawning
        #[arg(long)]
        dry_run: bool,
        /// Extra arguments appended to the daemon's defaults
        #[arg(long = "extra-args", num_args = 0.., allow_hyphen_values = true)]
        extra_args: Vec<String>,
    },
    /// Terminate a daemon (grace window, then hard kill)
    Banish {
        daemon_key: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Status of one daemon, or the whole fleet
    Scrying { daemon_key: Option<String> },
    /// Fleet view enriched with last heartbeats from the trail
    Sending,
    /// Detect deaths; optionally resurrect persistent daemons
    Watchdog {
        #[arg(long)]
        auto_resurrect: bool,
    },
    /// Dump the daemon registry
    List,
    /// Dimensional anchor operations
    Anchor {
        #[command(subcommand)]
        verb: AnchorVerb,
    },
    /// Run the P0 sensing loop
    Watcher(LoopArgs),
    /// Run the governance engine
    Governance {
        /// Run one rule evaluation and exit
        #[arg(long)]
        evaluate: bool,
        /// Print engine status from the trail and exit
        #[arg(long)]
        status: bool,
        /// Run the acceptance criteria once and exit
        #[arg(long)]
        validate: bool,
        #[arg(long)]
        dry_run: bool,
        /// Cycle interval in seconds
        #[arg(long, default_value_t = 300)]
        interval: u64,
    },
    /// Run the adversarial classifier loop
    #[command(alias = "adversarial")]
    Singer {
        #[command(flatten)]
        run: LoopArgs,
        /// Print the health snapshot and exit
        #[arg(long)]
        health: bool,
    },
    /// Run the document-mining loop
    Prospector {
        /// Run one cycle and exit
        #[arg(long)]
        once: bool,
        #[arg(long)]
        dry_run: bool,
        /// Documents per cycle
        #[arg(long, default_value_t = 3)]
        batch_size: i64,
        #[arg(long, default_value_t = 300)]
        interval: u64,
        /// Print prospector state and exit
        #[arg(long)]
        status: bool,
    },
    /// Run the strange loop
    #[command(alias = "strange-loop")]
    Kraken {
        #[command(flatten)]
        run: LoopArgs,
        /// Print loop status from the trail and exit
        #[arg(long)]
        status: bool,
    },
    /// Submit work to the compute queue and drain it
    Queue {
        #[command(subcommand)]
        verb: QueueVerb,
    },
    /// The five-pass pipeline compiler
    Wish {
        #[command(subcommand)]
        verb: WishVerb,
    },
}

#[derive(Args, Clone)]
pub struct LoopArgs {
    /// Run one cycle and exit
    #[arg(long)]
    pub single: bool,
    #[arg(long)]
    pub dry_run: bool,
    /// Cycle interval in seconds
    #[arg(long, default_value_t = 120)]
    pub interval: u64,
    /// Stop after this many cycles
    #[arg(long)]
    pub max_cycles: Option<u64>,
}

#[derive(Subcommand)]
pub enum AnchorVerb {
    /// Live resource probe; no prior anchor required
    Probe,
    /// Capture and pin a baseline
    Anchor,
    /// Re-capture and diff against the baseline
    Check,
    /// Anchor bookkeeping without re-probing
    Status,
    /// Deactivate the anchor
    Release,
}

#[derive(Subcommand)]
pub enum QueueVerb {
    /// Pending counts and store statistics
    Status,
    /// Embed every document without an embedding
    EmbedAll {
        #[arg(long, default_value_t = 50)]
        batch_size: i64,
        #[arg(long)]
        dry_run: bool,
    },
    /// Summarize documents through the expensive lane
    Enrich {
        /// Work type: summarize, classify, or evaluate
        #[arg(long, default_value = "summarize")]
        task: String,
        #[arg(long)]
        model: Option<String>,
        /// Documents to enqueue
        #[arg(long, default_value_t = 5)]
        limit: i64,
        #[arg(long)]
        dry_run: bool,
    },
    /// Semantic search over the embedding index
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum WishVerb {
    /// Run all five passes on an intent
    Compile {
        intent: String,
        #[arg(long)]
        dry_run: bool,
        /// Stop after this pass (1-5)
        #[arg(long)]
        stop_after: Option<u8>,
        /// Context document ids, comma separated
        #[arg(long, value_delimiter = ',')]
        context_docs: Vec<i64>,
    },
    /// Run only pass 1
    Pass1 {
        intent: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Re-enter a persisted pipeline at a pass
    Resume {
        wish_id: String,
        #[arg(long, default_value_t = 1)]
        from_pass: u8,
        #[arg(long)]
        dry_run: bool,
    },
    /// One pipeline's persisted state
    Status { wish_id: String },
    /// All pipelines, newest first
    List,
}
