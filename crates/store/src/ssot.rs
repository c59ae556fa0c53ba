// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSOT open/init. One connection per holder; SQLite serializes writers.

use crate::error::StoreError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Handle on the SSOT database.
///
/// Not `Sync`: each daemon (and each compute-queue lane) opens its own
/// handle. Transactional inserts keep `id` monotonic across handles.
pub struct Ssot {
    pub(crate) conn: Connection,
    pub(crate) path: PathBuf,
    pub(crate) fts_available: bool,
}

impl Ssot {
    /// Open (creating schema if needed) the SSOT at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn =
            Connection::open(&path).map_err(|e| StoreError::Open(path.clone(), e))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "journal_mode", "wal")?;
        let fts_available = init_schema(&conn)?;
        debug!(path = %path.display(), fts = fts_available, "ssot open");
        Ok(Self {
            conn,
            path,
            fts_available,
        })
    }

    /// Open an in-memory SSOT (tests and dry runs).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let fts_available = init_schema(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
            fts_available,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the database file in bytes (0 for in-memory).
    pub fn file_size(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

/// Create tables. Returns whether the FTS mirror is available.
fn init_schema(conn: &Connection) -> Result<bool, StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS stigmergy_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_type TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            subject TEXT NOT NULL DEFAULT '',
            source TEXT NOT NULL DEFAULT '',
            data_json TEXT NOT NULL,
            content_hash TEXT NOT NULL UNIQUE
        );
        CREATE INDEX IF NOT EXISTS idx_events_type ON stigmergy_events(event_type);
        CREATE INDEX IF NOT EXISTS idx_events_source ON stigmergy_events(source);
        CREATE INDEX IF NOT EXISTS idx_events_timestamp ON stigmergy_events(timestamp);

        CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL DEFAULT '',
            content TEXT NOT NULL DEFAULT '',
            bluf TEXT NOT NULL DEFAULT '',
            source TEXT NOT NULL DEFAULT '',
            port TEXT NOT NULL DEFAULT '',
            doc_type TEXT NOT NULL DEFAULT '',
            medallion TEXT NOT NULL DEFAULT 'bronze',
            word_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS embeddings (
            doc_id INTEGER PRIMARY KEY,
            model TEXT NOT NULL,
            dim INTEGER NOT NULL,
            vector BLOB NOT NULL,
            embedded_at TEXT NOT NULL
        );",
    )?;

    // FTS5 is compiled into the bundled SQLite, but stay usable without it.
    let fts = conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts
         USING fts5(title, content, content='documents', content_rowid='id');",
    );
    Ok(fts.is_ok())
}

#[cfg(test)]
#[path = "ssot_tests.rs"]
mod tests;
