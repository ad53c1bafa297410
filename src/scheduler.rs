//! Fixed-interval polling loop.
//!
//! Cycles never overlap: each runs to completion on a blocking thread and the
//! loop awaits it before waiting for the next tick. Ticks missed while a cycle
//! overran are skipped, not replayed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::orchestrator::{CycleSummary, ReplyOrchestrator};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerReport {
    pub cycles_run: usize,
    pub cycles_failed: usize,
}

/// Run one cycle off the async runtime.
pub async fn run_cycle_blocking(orchestrator: Arc<ReplyOrchestrator>) -> anyhow::Result<CycleSummary> {
    let summary = tokio::task::spawn_blocking(move || orchestrator.run_cycle(chrono::Utc::now()))
        .await
        .map_err(|e| anyhow::anyhow!("cycle task failed: {e}"))??;
    Ok(summary)
}

/// Run cycles every `interval` (the first immediately) until `shutdown` resolves.
///
/// Shutdown is observed between cycles; a running cycle always completes.
pub async fn run_scheduled(
    orchestrator: Arc<ReplyOrchestrator>,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> SchedulerReport {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut report = SchedulerReport::default();
    tracing::info!(interval_secs = interval.as_secs(), "scheduler started");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutdown requested, stopping scheduler");
                break;
            }
            _ = ticker.tick() => {
                report.cycles_run += 1;
                if let Err(e) = run_cycle_blocking(Arc::clone(&orchestrator)).await {
                    report.cycles_failed += 1;
                    tracing::error!(error = %e, "cycle aborted; next tick retries from scratch");
                }
            }
        }
    }

    tracing::info!(
        cycles_run = report.cycles_run,
        cycles_failed = report.cycles_failed,
        "scheduler stopped"
    );
    report
}
