//! The per-cycle reply pipeline.
//!
//! [`ReplyOrchestrator::run_cycle`] scans mentions, takes at most
//! `response_limit` of them in platform order, and drives each to a terminal
//! [`MentionOutcome`]:
//!
//! ```text
//! resolved ─┬─ self-root ───────────────────────────── SkippedSelf
//!           ├─ ledger has root ─────────────────────── SkippedDuplicate
//!           ├─ ledger check fails ──────────────────── DedupCheckFailed
//!           └─ answer ─┬─ fails ────────────────────── AnswerFailed
//!                      └─ publish ─┬─ fails ────────── PublishFailed
//!                                  └─ record ─┬─ ok ── Logged
//!                                             └─ err ─ LedgerWriteFailed
//! ```
//!
//! Mentions are processed sequentially, so the ledger check and the ledger
//! write for one root never interleave with another mention's. A ledger write
//! that fails after publishing is logged at error level and not retried: the
//! reply exists on the platform without a record, and a later cycle that sees
//! the same root again will answer it a second time.
//!
//! Mentions beyond the cap are not queued. They are picked up only if a later
//! scan still covers them, which requires the poll interval to be no longer
//! than the lookback window.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CycleError;
use crate::ledger::Ledger;
use crate::platform::Publisher;
use crate::scanner::MentionScanner;
use crate::synthesizer::AnswerSynthesizer;
use crate::types::{PostId, ReplyRecord, ResolvedMention};

/// Terminal state of one mention within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MentionOutcome {
    SkippedSelf,
    SkippedDuplicate,
    DedupCheckFailed,
    AnswerFailed,
    PublishFailed,
    Logged { reply_id: PostId },
    /// Published, but the ledger write failed.
    LedgerWriteFailed { reply_id: PostId },
}

#[derive(Debug, Clone, Serialize)]
pub struct MentionReport {
    pub mention_id: PostId,
    pub root_id: PostId,
    #[serde(flatten)]
    pub outcome: MentionOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub started_at: DateTime<Utc>,
    /// Mentions returned by the platform, before resolution.
    pub mentions_found: usize,
    pub mentions_unresolved: usize,
    /// Resolved mentions taken under the response cap.
    pub mentions_considered: usize,
    pub skipped_self: usize,
    pub skipped_duplicate: usize,
    /// Replies published, whether or not the ledger write succeeded.
    pub mentions_responded: usize,
    /// Dedup-check, answer and publish failures.
    pub mentions_error: usize,
    pub ledger_failures: usize,
    pub outcomes: Vec<MentionReport>,
}

impl CycleSummary {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            mentions_found: 0,
            mentions_unresolved: 0,
            mentions_considered: 0,
            skipped_self: 0,
            skipped_duplicate: 0,
            mentions_responded: 0,
            mentions_error: 0,
            ledger_failures: 0,
            outcomes: Vec::new(),
        }
    }

    fn tally(&mut self, report: MentionReport) {
        match &report.outcome {
            MentionOutcome::SkippedSelf => self.skipped_self += 1,
            MentionOutcome::SkippedDuplicate => self.skipped_duplicate += 1,
            MentionOutcome::DedupCheckFailed
            | MentionOutcome::AnswerFailed
            | MentionOutcome::PublishFailed => self.mentions_error += 1,
            MentionOutcome::Logged { .. } => self.mentions_responded += 1,
            MentionOutcome::LedgerWriteFailed { .. } => {
                self.mentions_responded += 1;
                self.ledger_failures += 1;
            }
        }
        self.outcomes.push(report);
    }
}

pub struct ReplyOrchestrator {
    scanner: MentionScanner,
    synthesizer: AnswerSynthesizer,
    publisher: Arc<dyn Publisher>,
    ledger: Arc<dyn Ledger>,
    response_limit: usize,
}

impl ReplyOrchestrator {
    pub fn new(
        scanner: MentionScanner,
        synthesizer: AnswerSynthesizer,
        publisher: Arc<dyn Publisher>,
        ledger: Arc<dyn Ledger>,
        response_limit: usize,
    ) -> Self {
        Self {
            scanner,
            synthesizer,
            publisher,
            ledger,
            response_limit,
        }
    }

    /// Run one full cycle as of `now`.
    ///
    /// Only a failed mention scan aborts the cycle; it has made no ledger
    /// writes at that point.
    pub fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleSummary, CycleError> {
        tracing::info!(started_at = %now, "starting reply cycle");
        let mut summary = CycleSummary::new(now);

        let scan = self.scanner.scan(now)?;
        summary.mentions_found = scan.found;
        summary.mentions_unresolved = scan.unresolved;

        if scan.found == 0 {
            tracing::info!("no mentions found");
            return Ok(summary);
        }

        let deferred = scan.mentions.len().saturating_sub(self.response_limit);
        if deferred > 0 {
            tracing::warn!(
                deferred,
                response_limit = self.response_limit,
                "response limit reached, remaining mentions deferred"
            );
        }

        for resolved in scan.mentions.iter().take(self.response_limit) {
            summary.mentions_considered += 1;
            let outcome = self.process(resolved);
            summary.tally(MentionReport {
                mention_id: resolved.mention.id.clone(),
                root_id: resolved.root.id.clone(),
                outcome,
            });
        }

        tracing::info!(
            found = summary.mentions_found,
            unresolved = summary.mentions_unresolved,
            responded = summary.mentions_responded,
            errors = summary.mentions_error,
            skipped_self = summary.skipped_self,
            skipped_duplicate = summary.skipped_duplicate,
            ledger_failures = summary.ledger_failures,
            "finished reply cycle"
        );
        Ok(summary)
    }

    /// Drive one resolved mention to its terminal state. Never fails the cycle.
    fn process(&self, resolved: &ResolvedMention) -> MentionOutcome {
        let mention = &resolved.mention;
        let root = &resolved.root;

        if resolved.is_self_root {
            tracing::debug!(mention_id = %mention.id, "mention is its own root, skipping");
            return MentionOutcome::SkippedSelf;
        }

        match self.ledger.has_replied(&root.id) {
            Ok(true) => {
                tracing::debug!(mention_id = %mention.id, root_id = %root.id, "already replied, skipping");
                return MentionOutcome::SkippedDuplicate;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    mention_id = %mention.id,
                    root_id = %root.id,
                    error = %e,
                    "ledger check failed, not replying"
                );
                return MentionOutcome::DedupCheckFailed;
            }
        }

        let answer = match self.synthesizer.answer(&root.text) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(mention_id = %mention.id, root_id = %root.id, error = %e, "answer failed");
                return MentionOutcome::AnswerFailed;
            }
        };

        // Reply under the mention, not the root.
        let reply_id = match self.publisher.create_reply(&answer.text, &mention.id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(mention_id = %mention.id, root_id = %root.id, error = %e, "publish failed");
                return MentionOutcome::PublishFailed;
            }
        };
        tracing::info!(
            mention_id = %mention.id,
            root_id = %root.id,
            reply_id = %reply_id,
            sources = ?answer.sources,
            "reply published"
        );

        let record = ReplyRecord {
            source_post_id: root.id.clone(),
            source_post_text: root.text.clone(),
            reply_post_id: reply_id.clone(),
            reply_text: answer.text,
            replied_at: Utc::now(),
            mentioned_at: mention.created_at,
        };

        match self.ledger.record(&record) {
            Ok(()) => MentionOutcome::Logged { reply_id },
            Err(e) => {
                tracing::error!(
                    mention_id = %mention.id,
                    root_id = %root.id,
                    reply_id = %reply_id,
                    error = %e,
                    "reply published but ledger write failed; root may be answered again"
                );
                MentionOutcome::LedgerWriteFailed { reply_id }
            }
        }
    }
}
