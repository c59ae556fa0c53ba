// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Embedding vectors for the cheap compute lane.
//!
//! Vectors are stored as little-endian f32 blobs keyed by document id.

use crate::error::StoreError;
use crate::ssot::Ssot;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};

impl Ssot {
    /// Insert or replace a document's embedding.
    pub fn upsert_embedding(
        &self,
        doc_id: i64,
        model: &str,
        vector: &[f32],
    ) -> Result<(), StoreError> {
        let blob = vector_to_blob(vector);
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false);
        self.conn.execute(
            "INSERT INTO embeddings (doc_id, model, dim, vector, embedded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(doc_id) DO UPDATE SET
                 model = excluded.model,
                 dim = excluded.dim,
                 vector = excluded.vector,
                 embedded_at = excluded.embedded_at",
            params![doc_id, model, vector.len() as i64, blob, now],
        )?;
        Ok(())
    }

    pub fn embedding(&self, doc_id: i64) -> Result<Option<Vec<f32>>, StoreError> {
        let blob: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT vector FROM embeddings WHERE doc_id = ?1",
                params![doc_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(blob.map(|b| blob_to_vector(&b)))
    }

    /// All stored embeddings (doc_id, vector), capped.
    pub fn all_embeddings(&self, limit: i64) -> Result<Vec<(i64, Vec<f32>)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT doc_id, vector FROM embeddings ORDER BY doc_id LIMIT ?1")?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, blob) = row?;
            out.push((id, blob_to_vector(&blob)));
        }
        Ok(out)
    }

    pub fn embedding_count(&self) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?)
    }
}

/// Cosine similarity of two vectors; 0.0 when either is degenerate.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
#[path = "embeddings_tests.rs"]
mod tests;
