//! Social-platform boundary.
//!
//! [`MentionSource`] reads mentions and posts; [`Publisher`] posts replies.
//! [`twitter::TwitterClient`] implements both against the X/Twitter v2 API.

pub mod twitter;

use chrono::{DateTime, Utc};

use crate::error::PlatformError;
use crate::types::{ConversationRoot, Mention, PostId};

pub trait MentionSource: Send + Sync {
    /// Mentions of `account_id` created at or after `since`, in platform order.
    ///
    /// Only the first page is returned; callers must treat the result as
    /// "first page of mentions in the window".
    fn mentions_since(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Mention>, PlatformError>;

    /// Look up a post. `Ok(None)` when it does not exist or was deleted.
    fn get_post(&self, id: &str) -> Result<Option<ConversationRoot>, PlatformError>;
}

pub trait Publisher: Send + Sync {
    /// Post `text` as a reply to `in_reply_to`. Returns the new post's id.
    fn create_reply(&self, text: &str, in_reply_to: &str) -> Result<PostId, PlatformError>;
}
