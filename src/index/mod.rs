//! Knowledge index construction.
//!
//! [`index_document`] chunks one corpus document, embeds the chunks in batches
//! and writes them to the index database, replacing any chunks previously
//! indexed from the same source. The running bot only reads the index.

pub mod chunker;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::db::{self, vector_to_bytes};
use crate::embedding::EmbeddingProvider;
use chunker::{split_text, ChunkOptions};

/// Chunks embedded per provider request.
pub const EMBED_BATCH_SIZE: usize = 64;

#[derive(Debug, Serialize)]
pub struct IndexReport {
    pub source: String,
    pub chunks: usize,
    /// Chunks removed from a previous build of the same source.
    pub replaced: usize,
}

/// Index a single document under `source`.
///
/// `on_progress` is called with the number of chunks embedded after each batch.
pub fn index_document(
    conn: &mut Connection,
    provider: &dyn EmbeddingProvider,
    source: &str,
    text: &str,
    opts: &ChunkOptions<'_>,
    mut on_progress: impl FnMut(usize),
) -> Result<IndexReport> {
    let chunks = split_text(text, opts);
    tracing::info!(source, chunks = chunks.len(), "document chunked");

    // Embed before opening the transaction so a provider failure leaves the
    // previous build of this source intact.
    let mut embeddings = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(EMBED_BATCH_SIZE) {
        let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
        let vectors = provider
            .embed_batch(&refs)
            .with_context(|| format!("failed to embed chunks of {source}"))?;
        embeddings.extend(vectors);
        on_progress(batch.len());
    }

    let tx = conn.transaction()?;
    let replaced = delete_source(&tx, source)?;

    let now = chrono::Utc::now().to_rfc3339();
    for (position, (content, embedding)) in chunks.iter().zip(&embeddings).enumerate() {
        tx.execute(
            "INSERT INTO chunks (source, position, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![source, position as i64, content, now],
        )?;
        let rowid = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO chunks_vec (rowid, embedding) VALUES (?1, ?2)",
            params![rowid, vector_to_bytes(embedding)],
        )?;
    }

    db::set_meta(&tx, "embedding_model", provider.model())?;
    tx.commit()?;

    if replaced > 0 {
        tracing::info!(source, replaced, "replaced previously indexed chunks");
    }

    Ok(IndexReport {
        source: source.to_string(),
        chunks: chunks.len(),
        replaced,
    })
}

fn delete_source(conn: &Connection, source: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM chunks_vec WHERE rowid IN (SELECT id FROM chunks WHERE source = ?1)",
        params![source],
    )?;
    conn.execute("DELETE FROM chunks WHERE source = ?1", params![source])
}

/// Number of chunks in the index.
pub fn chunk_count(conn: &Connection) -> rusqlite::Result<usize> {
    conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| {
        row.get::<_, i64>(0).map(|n| n as usize)
    })
}
