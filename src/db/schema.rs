//! SQL DDL for the ledger and knowledge-index databases.
//!
//! The ledger holds `reply_records` and `schema_meta`. The index holds
//! `chunks`, the `chunks_vec` (vec0) table keyed by chunk rowid, and its own
//! `schema_meta`. All DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

const LEDGER_SCHEMA_SQL: &str = r#"
-- One row per answered conversation root
CREATE TABLE IF NOT EXISTS reply_records (
    source_post_id TEXT PRIMARY KEY,
    source_post_text TEXT NOT NULL,
    reply_post_id TEXT NOT NULL,
    reply_text TEXT NOT NULL,
    replied_at TEXT NOT NULL,
    mentioned_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const INDEX_SCHEMA_SQL: &str = r#"
-- Corpus chunks; rowid doubles as the vector key
CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    position INTEGER NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize the ledger tables. Idempotent (uses IF NOT EXISTS).
pub fn init_ledger_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(LEDGER_SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

/// Initialize the index tables with a vec0 table of `dimensions` floats.
///
/// The dimension is recorded on first initialization; reopening with a
/// different dimension is reported by [`super::open_index_database`].
pub fn init_index_schema(conn: &Connection, dimensions: usize) -> rusqlite::Result<()> {
    conn.execute_batch(INDEX_SCHEMA_SQL)?;
    // vec0 virtual table must be created separately (sqlite-vec syntax).
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS chunks_vec USING vec0(embedding FLOAT[{dimensions}]);"
    ))?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('embedding_dim', ?1)",
        [dimensions.to_string()],
    )?;

    Ok(())
}
