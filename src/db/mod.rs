pub mod migrations;
pub mod schema;

use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OptionalExtension};
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Open (or create) the reply ledger at the given path with schema and
/// migrations applied.
pub fn open_ledger_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open ledger at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;

    schema::init_ledger_schema(&conn).context("failed to initialize ledger schema")?;
    migrations::run_migrations(&mut conn).context("failed to run ledger migrations")?;

    tracing::info!(path = %path.display(), "ledger database initialized");
    Ok(conn)
}

/// Open an in-memory ledger (tests and dry runs).
pub fn open_ledger_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("failed to open in-memory ledger")?;
    schema::init_ledger_schema(&conn).context("failed to initialize ledger schema")?;
    migrations::run_migrations(&mut conn).context("failed to run ledger migrations")?;
    Ok(conn)
}

/// Open (or create) the knowledge index with sqlite-vec loaded.
///
/// Fails if the index was built for a different embedding dimension.
pub fn open_index_database(path: impl AsRef<Path>, dimensions: usize) -> Result<Connection> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    load_sqlite_vec();

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open index at {}", path.display()))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::init_index_schema(&conn, dimensions).context("failed to initialize index schema")?;
    check_index_dimensions(&conn, dimensions)?;

    tracing::info!(path = %path.display(), dimensions, "index database initialized");
    Ok(conn)
}

/// Open an in-memory index with sqlite-vec loaded.
pub fn open_index_in_memory(dimensions: usize) -> Result<Connection> {
    load_sqlite_vec();
    let conn = Connection::open_in_memory().context("failed to open in-memory index")?;
    schema::init_index_schema(&conn, dimensions).context("failed to initialize index schema")?;
    Ok(conn)
}

fn check_index_dimensions(conn: &Connection, dimensions: usize) -> Result<()> {
    let stored = get_meta(conn, "embedding_dim")?;
    if let Some(stored) = stored {
        if stored != dimensions.to_string() {
            bail!(
                "index was built with {stored}-dimensional embeddings but {dimensions} are configured; \
                 rebuild it with `threadwise index build`"
            );
        }
    }
    Ok(())
}

/// Read a `schema_meta` value.
pub fn get_meta(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = ?1",
        [key],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

/// Insert or replace a `schema_meta` value.
pub fn set_meta(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}

/// Encode an f32 vector as little-endian bytes for sqlite-vec.
pub fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}
