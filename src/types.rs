//! Core domain types.
//!
//! [`Mention`] and [`ConversationRoot`] are read from the platform and never
//! persisted here. [`ReplyRecord`] is the ledger entry proving a root post has
//! been answered; at most one exists per `source_post_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque platform post identifier.
pub type PostId = String;

/// A post referencing the bot's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub id: PostId,
    /// Root post of the thread. `None` when the platform omitted it.
    pub conversation_id: Option<PostId>,
    pub created_at: DateTime<Utc>,
    pub author_id: Option<String>,
}

/// The original post a mention is attached to; the text that gets answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRoot {
    pub id: PostId,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// A mention paired with its resolved conversation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMention {
    pub mention: Mention,
    pub root: ConversationRoot,
    /// The mention is the root of its own conversation (nothing else is being asked about).
    pub is_self_root: bool,
}

impl ResolvedMention {
    pub fn new(mention: Mention, root: ConversationRoot) -> Self {
        let is_self_root = root.id == mention.id;
        Self {
            mention,
            root,
            is_self_root,
        }
    }
}

/// Durable proof that a conversation root has been answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRecord {
    /// Dedup key: the answered root post.
    pub source_post_id: PostId,
    pub source_post_text: String,
    pub reply_post_id: PostId,
    pub reply_text: String,
    pub replied_at: DateTime<Utc>,
    pub mentioned_at: DateTime<Utc>,
}

/// A knowledge-corpus passage returned by a retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    /// Where the passage came from (corpus file name).
    pub source: String,
}

/// Synthesized reply text plus the sources its grounding came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}
