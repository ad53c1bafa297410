//! Typed failures for each collaborator boundary.
//!
//! Only [`CycleError`] aborts a polling cycle. Every other error is isolated to
//! the mention that produced it.

use thiserror::Error;

/// Platform (mention source / publisher) failures.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("platform returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected platform response: {0}")]
    Decode(String),

    #[error("platform rejected the request: {0}")]
    Rejected(String),
}

/// Knowledge retrieval failures. A query with no match is not an error.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("failed to embed query: {0}")]
    Embedding(String),

    #[error("index query failed: {0}")]
    Index(#[from] rusqlite::Error),

    #[error("index unavailable: {0}")]
    Unavailable(String),
}

/// Language-model failures. Not retried at this layer.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion response contained no text")]
    EmptyResponse,

    #[error("generation failed: {0}")]
    Other(String),
}

/// Failures while producing an answer; wraps whichever dependency failed.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Ledger store failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("ledger request failed: {0}")]
    Remote(String),

    #[error("ledger already holds a record for source post {0}")]
    AlreadyRecorded(String),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for LedgerError {
    fn from(e: reqwest::Error) -> Self {
        Self::Remote(e.to_string())
    }
}

/// The only failure that aborts a whole cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("mention scan failed: {0}")]
    Scan(#[from] PlatformError),
}
