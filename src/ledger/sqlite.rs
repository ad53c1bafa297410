use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode};

use super::Ledger;
use crate::error::LedgerError;
use crate::types::ReplyRecord;

pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Wrap a connection opened with [`crate::db::open_ledger_database`].
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, LedgerError> {
        self.conn
            .lock()
            .map_err(|e| LedgerError::Unavailable(format!("ledger lock poisoned: {e}")))
    }

    /// Most recent records first.
    pub fn recent(&self, limit: usize) -> Result<Vec<ReplyRecord>, LedgerError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT source_post_id, source_post_text, reply_post_id, reply_text, replied_at, mentioned_at \
             FROM reply_records ORDER BY replied_at DESC LIMIT ?1",
        )?;
        let records = stmt
            .query_map(params![limit as i64], |row| {
                Ok(ReplyRecord {
                    source_post_id: row.get(0)?,
                    source_post_text: row.get(1)?,
                    reply_post_id: row.get(2)?,
                    reply_text: row.get(3)?,
                    replied_at: parse_timestamp(row.get::<_, String>(4)?, 4)?,
                    mentioned_at: parse_timestamp(row.get::<_, String>(5)?, 5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count(&self) -> Result<usize, LedgerError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM reply_records", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl Ledger for SqliteLedger {
    fn has_replied(&self, source_post_id: &str) -> Result<bool, LedgerError> {
        let conn = self.lock()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM reply_records WHERE source_post_id = ?1)",
            params![source_post_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn record(&self, reply: &ReplyRecord) -> Result<(), LedgerError> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO reply_records \
             (source_post_id, source_post_text, reply_post_id, reply_text, replied_at, mentioned_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                reply.source_post_id,
                reply.source_post_text,
                reply.reply_post_id,
                reply.reply_text,
                timestamp(reply.replied_at),
                timestamp(reply.mentioned_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(LedgerError::AlreadyRecorded(reply.source_post_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Fixed-width UTC timestamps so `ORDER BY replied_at` is chronological.
fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: String, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}
