// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-side queries over the document corpus.
//!
//! Ingestion is owned by external tooling; `insert_document` exists for
//! that tooling and for tests.

use crate::error::StoreError;
use crate::ssot::Ssot;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use std::collections::BTreeMap;

const PREVIEW_CHARS: usize = 4000;

/// A document row. `content` carries only the first 4000 characters when
/// fetched through sampling queries.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub bluf: String,
    pub source: String,
    pub port: String,
    pub doc_type: String,
    pub medallion: String,
    pub word_count: i64,
}

impl Ssot {
    pub fn doc_count(&self) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?)
    }

    /// Total words across the corpus.
    pub fn total_words(&self) -> Result<i64, StoreError> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(word_count), 0) FROM documents",
            [],
            |row| row.get(0),
        )?)
    }

    /// Document counts per medallion tier.
    pub fn medallion_counts(&self) -> Result<BTreeMap<String, i64>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT medallion, COUNT(*) FROM documents GROUP BY medallion")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get(1)?)))?;
        let mut out = BTreeMap::new();
        for row in rows {
            let (tier, count) = row?;
            out.insert(tier, count);
        }
        Ok(out)
    }

    pub fn get_document(&self, id: i64) -> Result<Option<Document>, StoreError> {
        let doc = self
            .conn
            .query_row(
                "SELECT id, title, SUBSTR(content, 1, ?2), bluf, source, port, doc_type,
                        medallion, word_count
                 FROM documents WHERE id = ?1",
                params![id, PREVIEW_CHARS as i64],
                row_to_document,
            )
            .optional()?;
        Ok(doc)
    }

    /// Sample documents not in the excluded set, weighted toward larger
    /// documents, skipping thin ones.
    pub fn sample_unconsidered(
        &self,
        excluded: &std::collections::BTreeSet<i64>,
        min_words: i64,
        limit: i64,
    ) -> Result<Vec<Document>, StoreError> {
        // Ids are integers from our own set; safe to inline as a CSV.
        let excluded_csv = if excluded.is_empty() {
            "-1".to_string()
        } else {
            excluded
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        let sql = format!(
            "SELECT id, title, SUBSTR(content, 1, {PREVIEW_CHARS}), bluf, source, port,
                    doc_type, medallion, word_count
             FROM documents
             WHERE id NOT IN ({excluded_csv}) AND word_count > ?1
             ORDER BY word_count * (ABS(RANDOM()) % 1000) DESC
             LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![min_words, limit], row_to_document)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Documents that have no embedding row yet.
    pub fn docs_without_embedding(&self, limit: i64) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id FROM documents d
             LEFT JOIN embeddings e ON e.doc_id = d.id
             WHERE e.doc_id IS NULL ORDER BY d.id LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| row.get(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Random document ids for fallback enrichment.
    pub fn random_doc_ids(&self, limit: i64) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM documents ORDER BY RANDOM() LIMIT ?1")?;
        let rows = stmt.query_map(params![limit], |row| row.get(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Rewrite a document's BLUF after enrichment.
    pub fn update_bluf(&self, id: i64, bluf: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE documents SET bluf = ?2 WHERE id = ?1",
            params![id, bluf],
        )?;
        Ok(())
    }

    /// Insert a document. Used by ingest tooling and tests.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_document(
        &self,
        title: &str,
        content: &str,
        bluf: &str,
        source: &str,
        port: &str,
        doc_type: &str,
        word_count: i64,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO documents (title, content, bluf, source, port, doc_type, word_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![title, content, bluf, source, port, doc_type, word_count],
        )?;
        let id = self.conn.last_insert_rowid();
        if self.fts_available {
            // Keep the FTS mirror in sync; a failed mirror write downgrades
            // fts_ok rather than failing the insert.
            let _ = self.conn.execute(
                "INSERT INTO documents_fts (rowid, title, content) VALUES (?1, ?2, ?3)",
                params![id, title, content],
            );
        }
        Ok(id)
    }

    /// Whether the full-text index answers queries.
    pub fn fts_ok(&self) -> bool {
        if !self.fts_available {
            return false;
        }
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM documents_fts WHERE documents_fts MATCH 'health'",
                [],
                |row| row.get::<_, i64>(0),
            )
            .is_ok()
    }
}

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        bluf: row.get(3)?,
        source: row.get(4)?,
        port: row.get(5)?,
        doc_type: row.get(6)?,
        medallion: row.get(7)?,
        word_count: row.get(8)?,
    })
}

#[cfg(test)]
#[path = "documents_tests.rs"]
mod tests;
