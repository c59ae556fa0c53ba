// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The P4 singer: adversarial classification of the trail.
//!
//! Scans recent events for strife (failure) and splendor (success)
//! signals, enriches each with an archetype from a static registry, and
//! writes derivative events back. Its own output matches its own scan
//! patterns, so an id high-water mark plus a source filter keeps the
//! loop from amplifying itself.

use async_trait::async_trait;
use hfo_core::{Component, EventType};
use hfo_store::{Ssot, StoredEvent};
use hfo_worker::{CycleReport, Worker, WorkerContext, WorkerError};
use serde_json::json;
use tracing::debug;

const EVT_STRIFE: EventType = EventType::new(Component::Singer, "strife");
const EVT_SPLENDOR: EventType = EventType::new(Component::Singer, "splendor");
const EVT_REQUESTED: EventType = EventType::new(Component::Singer, "requested");
const EVT_HEALTH: EventType = EventType::new(Component::Singer, "health");

const SCAN_LIMIT: i64 = 10;
const HEALTH_EVERY_N: u64 = 10;
const DEEP_TRAIL_THRESHOLD: i64 = 9_000;
const MASSIVE_CORPUS_WORDS: i64 = 8_000_000;

/// Failure-indicating signals.
pub const STRIFE_PATTERNS: &[&str] = &[
    "gate_blocked",
    "tamper",
    "memory_loss",
    "error",
    "failed",
    "crash",
    "timeout",
    "retry",
    "violation",
    "orphan",
    "broken",
];

/// Success-indicating signals.
pub const SPLENDOR_PATTERNS: &[&str] = &[
    "passed",
    "success",
    "validated",
    "promoted",
    "completed",
    "chain_verified",
    "yield",
    "perceive",
];

/// Strife signal -> adversarial archetype.
pub fn strife_archetype(pattern: &str) -> &'static str {
    match pattern {
        "gate_blocked" => "SHATTER",
        "tamper" => "SYMPATHETIC_VIBRATION",
        "memory_loss" => "WAIL_OF_THE_BANSHEE",
        "error" => "SOUND_LANCE",
        "failed" => "GREATER_SHOUT",
        "crash" => "POWERWORD_KILL",
        "timeout" => "FELL_DRAIN",
        "retry" => "SOUND_LANCE",
        "violation" => "SYMPATHETIC_VIBRATION",
        "orphan" => "WAIL_OF_THE_BANSHEE",
        "broken" => "SHATTER",
        _ => "SOUND_LANCE",
    }
}

/// Splendor signal -> buff archetype.
pub fn splendor_archetype(pattern: &str) -> &'static str {
    match pattern {
        "passed" => "INSPIRE_COURAGE",
        "success" => "INSPIRE_HEROICS",
        "validated" => "WORDS_OF_CREATION",
        "promoted" => "WORDS_OF_CREATION",
        "completed" => "INSPIRE_COURAGE",
        "chain_verified" => "HARMONIC_CHORUS",
        "yield" => "INSPIRE_COURAGE",
        "perceive" => "INSPIRE_COURAGE",
        _ => "INSPIRE_COURAGE",
    }
}

/// A request addressed to the singer, parsed from a yield event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRequest {
    pub action: String,
    pub song_name: String,
    pub reason: String,
}

/// Parse one `ACTION:SONG_NAME:REASON` token. `None` for malformed
/// tokens; callers tally those instead of dropping them silently.
pub fn parse_song_request(token: &str) -> Option<SongRequest> {
    let mut parts = token.splitn(3, ':');
    let action = parts.next()?.trim();
    let song_name = parts.next()?.trim();
    let reason = parts.next()?.trim();
    if action.is_empty() || song_name.is_empty() || reason.is_empty() {
        return None;
    }
    Some(SongRequest {
        action: action.to_string(),
        song_name: song_name.to_string(),
        reason: reason.to_string(),
    })
}

#[derive(Debug, Clone)]
struct Song {
    signal: String,
    source_event_id: Option<i64>,
    source_event_type: String,
    subject: String,
    song: &'static str,
    token_type: &'static str,
    archetype: &'static str,
}

/// The singer daemon.
pub struct SingerDaemon {
    high_water: i64,
    cycle: u64,
    total_strife: i64,
    total_splendor: i64,
    total_requested: i64,
    malformed_requests: i64,
}

impl SingerDaemon {
    pub fn new() -> Self {
        Self {
            high_water: 0,
            cycle: 0,
            total_strife: 0,
            total_splendor: 0,
            total_requested: 0,
            malformed_requests: 0,
        }
    }

    /// Scan above the high-water mark for one pattern set.
    fn scan(
        &self,
        ssot: &Ssot,
        own_source: &str,
        patterns: &[&str],
        song: &'static str,
        token_type: &'static str,
        archetype_of: fn(&str) -> &'static str,
    ) -> Result<(Vec<Song>, i64), WorkerError> {
        let mut songs = Vec::new();
        let mut max_id = self.high_water;
        for pattern in patterns {
            let like = format!("%{pattern}%");
            let events = ssot.query_signals_above(&like, self.high_water, SCAN_LIMIT)?;
            for event in events {
                max_id = max_id.max(event.id);
                if self.is_own(&event, own_source) {
                    continue;
                }
                songs.push(Song {
                    signal: pattern.to_string(),
                    source_event_id: Some(event.id),
                    source_event_type: event.event_type.clone(),
                    subject: event.subject.clone(),
                    song,
                    token_type,
                    archetype: archetype_of(pattern),
                });
            }
        }
        Ok((songs, max_id))
    }

    /// The singer never reclassifies itself.
    fn is_own(&self, event: &StoredEvent, own_source: &str) -> bool {
        event.source == own_source || event.event_type.contains(".singer.")
    }

    /// Structural indicators from the document corpus.
    fn scan_structural(&self, ssot: &Ssot) -> Result<Vec<Song>, WorkerError> {
        let mut songs = Vec::new();

        let tiers = ssot.medallion_counts()?;
        let total_docs = ssot.doc_count()?;
        let bronze = tiers.get("bronze").copied().unwrap_or(0);
        if total_docs > 0 && bronze == total_docs {
            songs.push(Song {
                signal: "ALL_BRONZE".into(),
                source_event_id: None,
                source_event_type: "structural".into(),
                subject: format!("All {total_docs} documents remain bronze"),
                song: "STRIFE",
                token_type: "FESTERING_ANGER_TOKEN",
                archetype: "FELL_DRAIN",
            });
        }

        let event_count = ssot.event_count()?;
        if event_count > DEEP_TRAIL_THRESHOLD {
            songs.push(Song {
                signal: "DEEP_STIGMERGY_TRAIL".into(),
                source_event_id: None,
                source_event_type: "structural".into(),
                subject: format!("{event_count} stigmergy events on the trail"),
                song: "SPLENDOR",
                token_type: "SPLENDOR_TOKEN",
                archetype: "HARMONIC_CHORUS",
            });
        }

        let words = ssot.total_words()?;
        if words > MASSIVE_CORPUS_WORDS {
            songs.push(Song {
                signal: "MASSIVE_CORPUS".into(),
                source_event_id: None,
                source_event_type: "structural".into(),
                subject: format!("{words} words stored"),
                song: "SPLENDOR",
                token_type: "SPLENDOR_TOKEN",
                archetype: "WORDS_OF_CREATION",
            });
        }

        Ok(songs)
    }

    /// Requests addressed to this worker, embedded in yield events.
    /// Returns (requests, max id seen, malformed token count).
    fn scan_requests(
        &self,
        ssot: &Ssot,
    ) -> Result<(Vec<(i64, SongRequest)>, i64, i64), WorkerError> {
        let events = ssot.query_signals_above("%perceive-yield%", self.high_water, SCAN_LIMIT)?;
        let mut requests = Vec::new();
        let mut max_id = self.high_water;
        let mut malformed = 0;
        for event in events {
            max_id = max_id.max(event.id);
            let tokens: Vec<String> = match event.payload().get("song_requests") {
                Some(serde_json::Value::Array(items)) => items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                Some(serde_json::Value::String(s)) => {
                    s.split(',').map(|t| t.trim().to_string()).collect()
                }
                _ => continue,
            };
            for token in tokens {
                match parse_song_request(&token) {
                    Some(request) => requests.push((event.id, request)),
                    None => malformed += 1,
                }
            }
        }
        Ok((requests, max_id, malformed))
    }

    fn emit_songs(
        &self,
        cx: &WorkerContext,
        songs: &[Song],
    ) -> Result<i64, WorkerError> {
        let mut emitted = 0;
        for song in songs {
            if cx.dry_run {
                emitted += 1;
                continue;
            }
            let event_type = if song.song == "STRIFE" {
                &EVT_STRIFE
            } else {
                &EVT_SPLENDOR
            };
            cx.publisher.publish(
                &cx.ssot,
                event_type,
                &format!("{}:{}", song.song, song.signal),
                json!({
                    "song": format!("SONGS_OF_{}", song.song),
                    "signal": song.signal,
                    "token_type": song.token_type,
                    "archetype": song.archetype,
                    "source_event_id": song.source_event_id,
                    "source_event_type": song.source_event_type,
                    "source_subject": song.subject,
                }),
            )?;
            emitted += 1;
        }
        Ok(emitted)
    }

    fn emit_health(&self, cx: &WorkerContext) -> Result<(), WorkerError> {
        if cx.dry_run {
            return Ok(());
        }
        let stats = cx.ssot.stats()?;
        let words = cx.ssot.total_words()?;
        let yields = cx.ssot.count_by_pattern("%yield%", 24 * 60)?;
        let perceives = cx.ssot.count_by_pattern("%perceive%", 24 * 60)?;
        cx.publisher.publish(
            &cx.ssot,
            &EVT_HEALTH,
            &format!("SINGER_HEALTH:cycle_{}", self.cycle),
            json!({
                "total_documents": stats.doc_count,
                "total_words": words,
                "total_stigmergy_events": stats.event_count,
                "stigmergy_data_bytes": cx.ssot.payload_bytes()?,
                "source_distribution": cx.ssot.source_distribution()?,
                "yields_24h": yields,
                "perceives_24h": perceives,
                "singer_metrics": {
                    "cycle_count": self.cycle,
                    "total_strife_sung": self.total_strife,
                    "total_splendor_sung": self.total_splendor,
                    "total_requested_sung": self.total_requested,
                    "malformed_requests": self.malformed_requests,
                },
            }),
        )?;
        Ok(())
    }
}

impl Default for SingerDaemon {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for SingerDaemon {
    fn key(&self) -> &str {
        "singer"
    }

    fn component(&self) -> Component {
        Component::Singer
    }

    async fn run_cycle(&mut self, cx: &mut WorkerContext) -> Result<CycleReport, WorkerError> {
        self.cycle += 1;
        let own_source = cx.publisher.source().to_string();

        let (strife, strife_max) = self.scan(
            &cx.ssot,
            &own_source,
            STRIFE_PATTERNS,
            "STRIFE",
            "FESTERING_ANGER_TOKEN",
            strife_archetype,
        )?;
        let (splendor, splendor_max) = self.scan(
            &cx.ssot,
            &own_source,
            SPLENDOR_PATTERNS,
            "SPLENDOR",
            "SPLENDOR_TOKEN",
            splendor_archetype,
        )?;
        let structural = self.scan_structural(&cx.ssot)?;
        let (requests, requests_max, malformed) = self.scan_requests(&cx.ssot)?;
        self.malformed_requests += malformed;

        let strife_sung = self.emit_songs(cx, &strife)?
            + self
                .emit_songs(cx, &structural.iter().filter(|s| s.song == "STRIFE").cloned().collect::<Vec<_>>())?;
        let splendor_sung = self.emit_songs(cx, &splendor)?
            + self.emit_songs(
                cx,
                &structural
                    .iter()
                    .filter(|s| s.song == "SPLENDOR")
                    .cloned()
                    .collect::<Vec<_>>(),
            )?;

        let mut requested_sung = 0;
        for (event_id, request) in &requests {
            if !cx.dry_run {
                cx.publisher.publish(
                    &cx.ssot,
                    &EVT_REQUESTED,
                    &format!("REQUESTED:{}", request.song_name),
                    json!({
                        "song": "SONG_REQUEST",
                        "action": request.action,
                        "song_name": request.song_name,
                        "reason": request.reason,
                        "source_event_id": event_id,
                    }),
                )?;
            }
            requested_sung += 1;
        }

        self.total_strife += strife_sung;
        self.total_splendor += splendor_sung;
        self.total_requested += requested_sung;

        // Advance past everything seen this cycle, own emissions included:
        // the next scan starts above the newest row.
        let scanned_max = strife_max.max(splendor_max).max(requests_max);
        let newest = cx
            .ssot
            .read_last_matching("%")?
            .map(|e| e.id)
            .unwrap_or(scanned_max);
        self.high_water = scanned_max.max(newest);

        if self.cycle % HEALTH_EVERY_N == 0 {
            self.emit_health(cx)?;
        }

        debug!(
            cycle = self.cycle,
            strife_sung, splendor_sung, requested_sung, "singer cycle"
        );
        Ok(CycleReport::default()
            .tally("strife_sung", strife_sung)
            .tally("splendor_sung", splendor_sung)
            .tally("requested_sung", requested_sung)
            .tally("malformed_requests", malformed))
    }
}

#[cfg(test)]
#[path = "singer_tests.rs"]
mod tests;
