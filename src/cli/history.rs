use anyhow::Result;

use threadwise::config::BotConfig;
use threadwise::db;
use threadwise::ledger::SqliteLedger;

use super::preview;

/// Print the most recent ledger records.
pub fn history(config: &BotConfig, limit: usize) -> Result<()> {
    if config.ledger.backend != "sqlite" {
        println!(
            "History is only available for the sqlite ledger (configured: {}).",
            config.ledger.backend
        );
        return Ok(());
    }

    let path = config.resolved_ledger_path();
    if !path.exists() {
        println!("Ledger: not found at {}", path.display());
        return Ok(());
    }

    let ledger = SqliteLedger::new(db::open_ledger_database(&path)?);
    let total = ledger.count()?;
    let records = ledger.recent(limit)?;

    println!("{total} reply record(s) in {}", path.display());
    for record in records {
        println!();
        println!(
            "  {}  root {} -> reply {}",
            record.replied_at.format("%Y-%m-%d %H:%M:%S"),
            record.source_post_id,
            record.reply_post_id
        );
        println!("    Q: {}", preview(&record.source_post_text, 100));
        println!("    A: {}", preview(&record.reply_text, 100));
    }
    Ok(())
}
