//! X/Twitter API v2 client.
//!
//! Authenticates with an OAuth 2.0 user-context bearer token, which the v2
//! API accepts for `users/me`, mention timelines, tweet lookup and tweet
//! creation. Pagination and rate-limit backoff are not handled.

use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{MentionSource, Publisher};
use crate::config::TwitterConfig;
use crate::error::PlatformError;
use crate::types::{ConversationRoot, Mention, PostId};

pub struct TwitterClient {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
}

#[derive(Deserialize)]
struct User {
    id: String,
}

#[derive(Deserialize)]
struct Tweet {
    id: String,
    #[serde(default)]
    text: String,
    created_at: Option<DateTime<Utc>>,
    conversation_id: Option<String>,
    author_id: Option<String>,
}

#[derive(Deserialize)]
struct CreatedTweet {
    id: String,
}

#[derive(Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
    reply: ReplySettings<'a>,
}

#[derive(Serialize)]
struct ReplySettings<'a> {
    in_reply_to_tweet_id: &'a str,
}

impl TwitterClient {
    pub fn new(config: &TwitterConfig, token: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build Twitter HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/2/{path}", self.base_url)
    }

    /// The authenticated account's id; mentions are scanned for this account.
    pub fn me_id(&self) -> Result<String, PlatformError> {
        let response = self.client.get(self.url("users/me")).bearer_auth(&self.token).send()?;
        let envelope: Envelope<User> = decode(response)?;
        envelope
            .data
            .map(|u| u.id)
            .ok_or_else(|| PlatformError::Decode(describe_errors(&envelope.errors)))
    }
}

impl MentionSource for TwitterClient {
    fn mentions_since(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Mention>, PlatformError> {
        let response = self
            .client
            .get(self.url(&format!("users/{account_id}/mentions")))
            .bearer_auth(&self.token)
            .query(&[
                ("start_time", format_start_time(since).as_str()),
                ("tweet.fields", "created_at,conversation_id,author_id"),
                ("expansions", "referenced_tweets.id"),
            ])
            .send()?;

        let envelope: Envelope<Vec<Tweet>> = decode(response)?;
        if envelope.data.is_none() && !envelope.errors.is_empty() {
            return Err(PlatformError::Rejected(describe_errors(&envelope.errors)));
        }

        envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(into_mention)
            .collect()
    }

    fn get_post(&self, id: &str) -> Result<Option<ConversationRoot>, PlatformError> {
        let response = self
            .client
            .get(self.url(&format!("tweets/{id}")))
            .bearer_auth(&self.token)
            .query(&[("tweet.fields", "created_at,conversation_id")])
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        // Deleted or protected tweets come back as 200 with only `errors`.
        let envelope: Envelope<Tweet> = decode(response)?;
        Ok(envelope.data.map(|t| ConversationRoot {
            id: t.id,
            text: t.text,
            created_at: t.created_at,
        }))
    }
}

impl Publisher for TwitterClient {
    fn create_reply(&self, text: &str, in_reply_to: &str) -> Result<PostId, PlatformError> {
        let response = self
            .client
            .post(self.url("tweets"))
            .bearer_auth(&self.token)
            .json(&CreateTweetRequest {
                text,
                reply: ReplySettings {
                    in_reply_to_tweet_id: in_reply_to,
                },
            })
            .send()?;

        let envelope: Envelope<CreatedTweet> = decode(response)?;
        envelope
            .data
            .map(|t| t.id)
            .ok_or_else(|| PlatformError::Rejected(describe_errors(&envelope.errors)))
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, PlatformError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(PlatformError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let body = response.text()?;
    serde_json::from_str(&body).map_err(|e| PlatformError::Decode(e.to_string()))
}

fn into_mention(tweet: Tweet) -> Result<Mention, PlatformError> {
    let created_at = tweet.created_at.ok_or_else(|| {
        PlatformError::Decode(format!("mention {} has no created_at", tweet.id))
    })?;
    Ok(Mention {
        id: tweet.id,
        conversation_id: tweet.conversation_id,
        created_at,
        author_id: tweet.author_id,
    })
}

fn describe_errors(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "response contained no data".into();
    }
    errors
        .iter()
        .map(|e| format!("{}: {}", e.title, e.detail))
        .collect::<Vec<_>>()
        .join("; ")
}

/// `YYYY-MM-DDTHH:MM:SSZ`, the precision the v2 API accepts.
fn format_start_time(since: DateTime<Utc>) -> String {
    since.to_rfc3339_opts(SecondsFormat::Secs, true)
}
