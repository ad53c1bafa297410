//! Knowledge retrieval.
//!
//! [`Retriever`] returns corpus passages for a question, most similar first.
//! [`VectorRetriever`] answers it with a sqlite-vec KNN query over the index
//! built by [`crate::index`]. The index is opened once at startup and shared
//! read-only by every cycle.

use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};

use crate::db::vector_to_bytes;
use crate::embedding::EmbeddingProvider;
use crate::error::RetrievalError;
use crate::types::Passage;

pub trait Retriever: Send + Sync {
    /// Passages ranked by similarity. An empty corpus or no match yields `Ok(vec![])`.
    fn retrieve(&self, question: &str) -> Result<Vec<Passage>, RetrievalError>;
}

pub struct VectorRetriever {
    index: Mutex<Connection>,
    embedding: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl VectorRetriever {
    pub fn new(index: Connection, embedding: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            index: Mutex::new(index),
            embedding,
            top_k,
        }
    }
}

impl Retriever for VectorRetriever {
    fn retrieve(&self, question: &str) -> Result<Vec<Passage>, RetrievalError> {
        let query = self
            .embedding
            .embed(question)
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let conn = self
            .index
            .lock()
            .map_err(|e| RetrievalError::Unavailable(format!("index lock poisoned: {e}")))?;

        let passages = nearest_chunks(&conn, &query, self.top_k)?;
        tracing::debug!(hits = passages.len(), top_k = self.top_k, "retrieved passages");
        Ok(passages)
    }
}

/// KNN over `chunks_vec`, joined back to chunk text and source.
pub fn nearest_chunks(
    conn: &Connection,
    query: &[f32],
    k: usize,
) -> Result<Vec<Passage>, RetrievalError> {
    let mut stmt = conn.prepare(
        "SELECT c.content, c.source \
         FROM chunks_vec v JOIN chunks c ON c.id = v.rowid \
         WHERE v.embedding MATCH ?1 AND k = ?2 \
         ORDER BY v.distance",
    )?;

    let passages = stmt
        .query_map(params![vector_to_bytes(query), k as i64], |row| {
            Ok(Passage {
                content: row.get(0)?,
                source: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(passages)
}
