// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only stigmergy event log (read/write surface).
//!
//! Writers insert through `append`; dedup is on `content_hash`. Nothing
//! in the running system updates or deletes a stored row.

use crate::error::StoreError;
use crate::ssot::Ssot;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;

const APPEND_RETRIES: u32 = 5;
const APPEND_BACKOFF_BASE_MS: u64 = 50;

/// A stored event row, with `data_json` parsed.
#[derive(Debug, Clone, Serialize)]
pub struct StoredEvent {
    pub id: i64,
    pub event_type: String,
    pub timestamp: String,
    pub subject: String,
    pub source: String,
    pub data: serde_json::Value,
    pub content_hash: String,
}

impl StoredEvent {
    /// The component payload inside the envelope (`data.data`).
    pub fn payload(&self) -> &serde_json::Value {
        self.data.get("data").unwrap_or(&serde_json::Value::Null)
    }
}

/// Store-level health facts for probes and dashboards.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SsotStats {
    pub doc_count: i64,
    pub event_count: i64,
    pub fts_ok: bool,
}

impl Ssot {
    /// Insert an event unless its `content_hash` is already present.
    ///
    /// Returns the assigned id, or 0 when the insert was deduped.
    /// Contention retries with exponential backoff up to a fixed ceiling,
    /// then surfaces `StoreError::Contended`.
    pub fn append(
        &self,
        event_type: &str,
        timestamp: &str,
        subject: &str,
        source: &str,
        data_json: &str,
        content_hash: &str,
    ) -> Result<i64, StoreError> {
        let mut backoff = Duration::from_millis(APPEND_BACKOFF_BASE_MS);
        let mut last_busy: Option<rusqlite::Error> = None;

        for attempt in 0..APPEND_RETRIES {
            let result = self.conn.execute(
                "INSERT OR IGNORE INTO stigmergy_events
                 (event_type, timestamp, subject, source, data_json, content_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![event_type, timestamp, subject, source, data_json, content_hash],
            );
            match result {
                Ok(0) => return Ok(0), // deduped
                Ok(_) => return Ok(self.conn.last_insert_rowid()),
                Err(e) if is_busy(&e) => {
                    if attempt + 1 < APPEND_RETRIES {
                        warn!(attempt, "ssot busy, retrying append");
                        std::thread::sleep(backoff);
                        backoff *= 2;
                    }
                    last_busy = Some(e);
                }
                Err(e) => return Err(StoreError::Query(e)),
            }
        }
        match last_busy {
            Some(e) => Err(StoreError::Contended(e)),
            None => Ok(0),
        }
    }

    /// Events whose type matches a LIKE pattern within a recency window,
    /// newest first.
    pub fn query_by_pattern(
        &self,
        pattern: &str,
        since_minutes: i64,
        limit: i64,
    ) -> Result<Vec<StoredEvent>, StoreError> {
        let cutoff = window_cutoff(since_minutes);
        let mut stmt = self.conn.prepare(
            "SELECT id, event_type, timestamp, subject, source, data_json, content_hash
             FROM stigmergy_events
             WHERE event_type LIKE ?1 AND timestamp > ?2
             ORDER BY id DESC LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![pattern, cutoff, limit], row_to_event)?;
        collect_events(rows)
    }

    /// Events matching a LIKE pattern on type OR subject above an id
    /// high-water mark, newest first. The singer's scan primitive.
    pub fn query_signals_above(
        &self,
        pattern: &str,
        min_id_exclusive: i64,
        limit: i64,
    ) -> Result<Vec<StoredEvent>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_type, timestamp, subject, source, data_json, content_hash
             FROM stigmergy_events
             WHERE (event_type LIKE ?1 OR subject LIKE ?1) AND id > ?2
             ORDER BY id DESC LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![pattern, min_id_exclusive, limit], row_to_event)?;
        collect_events(rows)
    }

    /// Count of events matching a LIKE pattern within a recency window.
    pub fn count_by_pattern(&self, pattern: &str, since_minutes: i64) -> Result<i64, StoreError> {
        let cutoff = window_cutoff(since_minutes);
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM stigmergy_events
             WHERE event_type LIKE ?1 AND timestamp > ?2",
            params![pattern, cutoff],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count of events from sources matching a LIKE pattern in a window.
    pub fn count_by_source(&self, pattern: &str, since_minutes: i64) -> Result<i64, StoreError> {
        let cutoff = window_cutoff(since_minutes);
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM stigmergy_events
             WHERE source LIKE ?1 AND timestamp > ?2",
            params![pattern, cutoff],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count of events whose payload contains a needle, optionally scoped
    /// to sources matching a LIKE pattern.
    pub fn count_payload_matches(
        &self,
        needle: &str,
        source_pattern: &str,
        since_minutes: i64,
    ) -> Result<i64, StoreError> {
        let cutoff = window_cutoff(since_minutes);
        let like = format!("%{needle}%");
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM stigmergy_events
             WHERE data_json LIKE ?1 AND source LIKE ?2 AND timestamp > ?3",
            params![like, source_pattern, cutoff],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Events above an id high-water mark, oldest first.
    pub fn read_by_id_range(
        &self,
        min_id_exclusive: i64,
        limit: i64,
    ) -> Result<Vec<StoredEvent>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_type, timestamp, subject, source, data_json, content_hash
             FROM stigmergy_events WHERE id > ?1 ORDER BY id ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![min_id_exclusive, limit], row_to_event)?;
        collect_events(rows)
    }

    /// Newest event of an exact type.
    pub fn read_last_of_type(&self, event_type: &str) -> Result<Option<StoredEvent>, StoreError> {
        let event = self
            .conn
            .query_row(
                "SELECT id, event_type, timestamp, subject, source, data_json, content_hash
                 FROM stigmergy_events WHERE event_type = ?1 ORDER BY id DESC LIMIT 1",
                params![event_type],
                row_to_event,
            )
            .optional()?;
        Ok(event)
    }

    /// Newest event whose type matches a LIKE pattern.
    pub fn read_last_matching(&self, pattern: &str) -> Result<Option<StoredEvent>, StoreError> {
        let event = self
            .conn
            .query_row(
                "SELECT id, event_type, timestamp, subject, source, data_json, content_hash
                 FROM stigmergy_events WHERE event_type LIKE ?1 ORDER BY id DESC LIMIT 1",
                params![pattern],
                row_to_event,
            )
            .optional()?;
        Ok(event)
    }

    /// Newest heartbeat-typed event from sources matching a LIKE pattern.
    pub fn last_heartbeat(
        &self,
        source_pattern: &str,
    ) -> Result<Option<(String, String)>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT timestamp, subject FROM stigmergy_events
                 WHERE source LIKE ?1 AND event_type LIKE '%heartbeat%'
                 ORDER BY id DESC LIMIT 1",
                params![source_pattern],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    /// Distinct sources that published anything in the window.
    pub fn active_sources(&self, since_minutes: i64) -> Result<Vec<String>, StoreError> {
        let cutoff = window_cutoff(since_minutes);
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT source FROM stigmergy_events WHERE timestamp > ?1",
        )?;
        let rows = stmt.query_map(params![cutoff], |row| row.get(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Total number of stored events.
    pub fn event_count(&self) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM stigmergy_events", [], |row| row.get(0))?)
    }

    /// Total bytes of stored payloads (health dashboards).
    pub fn payload_bytes(&self) -> Result<i64, StoreError> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(data_json)), 0) FROM stigmergy_events",
            [],
            |row| row.get(0),
        )?)
    }

    /// Content hashes that appear more than once (must be empty).
    pub fn duplicate_hashes(&self) -> Result<i64, StoreError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM (
                 SELECT content_hash FROM stigmergy_events
                 GROUP BY content_hash HAVING COUNT(*) > 1
             )",
            [],
            |row| row.get(0),
        )?)
    }

    /// Event counts grouped by source, descending.
    pub fn source_distribution(&self) -> Result<BTreeMap<String, i64>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, COUNT(*) FROM stigmergy_events GROUP BY source")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get(1)?)))?;
        let mut out = BTreeMap::new();
        for row in rows {
            let (source, count) = row?;
            out.insert(source, count);
        }
        Ok(out)
    }

    /// Store-level health facts.
    pub fn stats(&self) -> Result<SsotStats, StoreError> {
        Ok(SsotStats {
            doc_count: self.doc_count()?,
            event_count: self.event_count()?,
            fts_ok: self.fts_ok(),
        })
    }
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::DatabaseBusy
                || e.code == rusqlite::ErrorCode::DatabaseLocked
    )
}

/// Inclusive-exclusive RFC 3339 cutoff for "last N minutes".
fn window_cutoff(since_minutes: i64) -> String {
    (Utc::now() - ChronoDuration::minutes(since_minutes))
        .to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredEvent> {
    let data_json: String = row.get(5)?;
    Ok(StoredEvent {
        id: row.get(0)?,
        event_type: row.get(1)?,
        timestamp: row.get(2)?,
        subject: row.get(3)?,
        source: row.get(4)?,
        data: serde_json::from_str(&data_json).unwrap_or(serde_json::Value::Null),
        content_hash: row.get(6)?,
    })
}

fn collect_events(
    rows: impl Iterator<Item = rusqlite::Result<StoredEvent>>,
) -> Result<Vec<StoredEvent>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
