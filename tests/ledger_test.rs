mod helpers;

use chrono::Duration;
use helpers::{existing_record, t0};
use tempfile::TempDir;
use threadwise::config::{Credentials, LedgerConfig};
use threadwise::db;
use threadwise::db::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use threadwise::error::LedgerError;
use threadwise::ledger::{create_ledger, Ledger, SqliteLedger};

#[test]
fn records_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ledger.db");

    {
        let ledger = SqliteLedger::new(db::open_ledger_database(&path).unwrap());
        ledger.record(&existing_record("c1")).unwrap();
    }

    let ledger = SqliteLedger::new(db::open_ledger_database(&path).unwrap());
    assert!(ledger.has_replied("c1").unwrap());
    assert!(!ledger.has_replied("c2").unwrap());

    let records = ledger.recent(5).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reply_text, "earlier answer");
    assert_eq!(records[0].replied_at, t0() - Duration::days(1));
}

#[test]
fn open_creates_missing_parent_directories() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("dir").join("ledger.db");

    let conn = db::open_ledger_database(&path).unwrap();
    assert!(path.exists());
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn reopening_does_not_rerun_migrations() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ledger.db");

    drop(db::open_ledger_database(&path).unwrap());
    let conn = db::open_ledger_database(&path).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);

    let indexed: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = 'idx_reply_records_replied_at')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(indexed);
}

#[test]
fn duplicate_root_is_rejected_and_original_kept() {
    let ledger = SqliteLedger::new(db::open_ledger_in_memory().unwrap());
    ledger.record(&existing_record("c1")).unwrap();

    let mut again = existing_record("c1");
    again.reply_post_id = "second-reply".into();
    let err = ledger.record(&again).unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyRecorded(ref id) if id == "c1"));

    let records = ledger.recent(5).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reply_post_id, "old-reply");
}

#[test]
fn create_ledger_selects_sqlite_backend() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ledger.db");
    let config = LedgerConfig::default();

    let ledger = create_ledger(&config, &path, &Credentials::default()).unwrap();
    ledger.record(&existing_record("c7")).unwrap();
    assert!(ledger.has_replied("c7").unwrap());
}

#[test]
fn create_ledger_rejects_unknown_backend() {
    let tmp = TempDir::new().unwrap();
    let config = LedgerConfig {
        backend: "spreadsheet".into(),
        ..LedgerConfig::default()
    };

    let err = create_ledger(&config, &tmp.path().join("l.db"), &Credentials::default())
        .err()
        .unwrap();
    assert!(err.to_string().contains("unknown ledger backend"));
}

#[test]
fn airtable_backend_requires_token() {
    let tmp = TempDir::new().unwrap();
    let config = LedgerConfig {
        backend: "airtable".into(),
        airtable_base_id: "appXYZ".into(),
        ..LedgerConfig::default()
    };

    let err = create_ledger(&config, &tmp.path().join("l.db"), &Credentials::default())
        .err()
        .unwrap();
    assert!(err.to_string().contains("AIRTABLE_TOKEN"));
}
