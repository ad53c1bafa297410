//! Mention scanning and root resolution.
//!
//! One scan asks the platform for the first page of mentions inside the
//! lookback window and resolves each mention's conversation root. Mentions
//! whose root cannot be resolved are dropped and counted, never retried.
//! Self-root mentions are kept and flagged; filtering them is the
//! orchestrator's job.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::PlatformError;
use crate::platform::MentionSource;
use crate::types::{Mention, ResolvedMention};

/// Result of one scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Mentions the platform returned, before resolution.
    pub found: usize,
    /// Mentions with a resolved root, in platform order.
    pub mentions: Vec<ResolvedMention>,
    /// Mentions dropped because their root could not be resolved.
    pub unresolved: usize,
}

pub struct MentionScanner {
    source: Arc<dyn MentionSource>,
    account_id: String,
    window: Duration,
}

impl MentionScanner {
    pub fn new(source: Arc<dyn MentionSource>, account_id: impl Into<String>, window: Duration) -> Self {
        Self {
            source,
            account_id: account_id.into(),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Scan mentions created in `[now - window, now]`.
    ///
    /// Fails only when the mention query itself fails.
    pub fn scan(&self, now: DateTime<Utc>) -> Result<ScanReport, PlatformError> {
        let since = now - self.window;
        let mentions = self.source.mentions_since(&self.account_id, since)?;
        tracing::debug!(found = mentions.len(), since = %since, "mentions fetched");

        let mut report = ScanReport {
            found: mentions.len(),
            ..Default::default()
        };

        for mention in mentions {
            match self.resolve(mention) {
                Some(resolved) => report.mentions.push(resolved),
                None => report.unresolved += 1,
            }
        }

        Ok(report)
    }

    fn resolve(&self, mention: Mention) -> Option<ResolvedMention> {
        let Some(conversation_id) = mention.conversation_id.clone() else {
            tracing::warn!(mention_id = %mention.id, "mention has no conversation id, dropping");
            return None;
        };

        match self.source.get_post(&conversation_id) {
            Ok(Some(root)) => Some(ResolvedMention::new(mention, root)),
            Ok(None) => {
                tracing::warn!(
                    mention_id = %mention.id,
                    root_id = %conversation_id,
                    "conversation root not found, dropping mention"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    mention_id = %mention.id,
                    root_id = %conversation_id,
                    error = %e,
                    "failed to resolve conversation root, dropping mention"
                );
                None
            }
        }
    }
}
