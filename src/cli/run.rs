//! CLI `run` and `once` commands.

use std::sync::Arc;

use anyhow::{Context, Result};

use threadwise::config::BotConfig;
use threadwise::orchestrator::{CycleSummary, MentionOutcome};
use threadwise::{bot, scheduler};

async fn build(config: BotConfig) -> Result<Arc<threadwise::orchestrator::ReplyOrchestrator>> {
    // Setup makes blocking HTTP and SQLite calls.
    let orchestrator = tokio::task::spawn_blocking(move || bot::build_orchestrator(&config))
        .await
        .context("setup task failed")??;
    Ok(Arc::new(orchestrator))
}

/// Poll until Ctrl-C.
pub async fn run(config: BotConfig) -> Result<()> {
    let interval = config.poll_interval();
    let orchestrator = build(config).await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    let report = scheduler::run_scheduled(orchestrator, interval, shutdown).await;
    println!(
        "Stopped after {} cycle(s), {} failed.",
        report.cycles_run, report.cycles_failed
    );
    Ok(())
}

/// One cycle, then print the summary.
pub async fn once(config: BotConfig, json: bool) -> Result<()> {
    let orchestrator = build(config).await?;
    let summary = scheduler::run_cycle_blocking(orchestrator).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &CycleSummary) {
    println!("Cycle started {}", summary.started_at.to_rfc3339());
    println!("  Found:       {}", summary.mentions_found);
    println!("  Unresolved:  {}", summary.mentions_unresolved);
    println!("  Considered:  {}", summary.mentions_considered);
    println!("  Responded:   {}", summary.mentions_responded);
    println!("  Errors:      {}", summary.mentions_error);
    println!(
        "  Skipped:     {} self, {} duplicate",
        summary.skipped_self, summary.skipped_duplicate
    );
    if summary.ledger_failures > 0 {
        println!(
            "  WARNING: {} reply(ies) published without a ledger record",
            summary.ledger_failures
        );
    }

    if summary.outcomes.is_empty() {
        return;
    }
    println!();
    for report in &summary.outcomes {
        let outcome = match &report.outcome {
            MentionOutcome::SkippedSelf => "skipped (self root)".to_string(),
            MentionOutcome::SkippedDuplicate => "skipped (already answered)".to_string(),
            MentionOutcome::DedupCheckFailed => "error (ledger check)".to_string(),
            MentionOutcome::AnswerFailed => "error (answer)".to_string(),
            MentionOutcome::PublishFailed => "error (publish)".to_string(),
            MentionOutcome::Logged { reply_id } => format!("replied {reply_id}"),
            MentionOutcome::LedgerWriteFailed { reply_id } => {
                format!("replied {reply_id}, NOT RECORDED")
            }
        };
        println!("  {} -> {}: {outcome}", report.mention_id, report.root_id);
    }
}
