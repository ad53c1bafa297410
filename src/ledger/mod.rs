//! Durable reply ledger used for deduplication.
//!
//! A [`Ledger`] answers "has this conversation root already been answered?"
//! and appends a [`ReplyRecord`] after a reply is published. Records are
//! never updated or deleted. Two backends:
//!
//! - [`SqliteLedger`]: keyed lookup on `source_post_id`, rejects a second
//!   record for the same root.
//! - [`AirtableLedger`]: full scan of the table on every check, O(n) in the
//!   reply history. Archive old rows to keep cycles cheap.

pub mod airtable;
pub mod sqlite;

pub use airtable::AirtableLedger;
pub use sqlite::SqliteLedger;

use anyhow::Result;

use crate::config::{Credentials, LedgerConfig};
use crate::error::LedgerError;
use crate::types::ReplyRecord;

pub trait Ledger: Send + Sync {
    /// `true` iff a record exists for `source_post_id`. No side effects.
    fn has_replied(&self, source_post_id: &str) -> Result<bool, LedgerError>;

    /// Append one record.
    fn record(&self, reply: &ReplyRecord) -> Result<(), LedgerError>;
}

/// Create the configured ledger backend.
pub fn create_ledger(
    config: &LedgerConfig,
    db_path: &std::path::Path,
    credentials: &Credentials,
) -> Result<Box<dyn Ledger>> {
    match config.backend.as_str() {
        "sqlite" => {
            let conn = crate::db::open_ledger_database(db_path)?;
            Ok(Box::new(SqliteLedger::new(conn)))
        }
        "airtable" => {
            let ledger = AirtableLedger::new(config, credentials.airtable_token()?)?;
            Ok(Box::new(ledger))
        }
        other => anyhow::bail!("unknown ledger backend: {other}. Supported: sqlite, airtable"),
    }
}
