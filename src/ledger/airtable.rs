//! Airtable-backed ledger.
//!
//! Rows use the field names of the bot's existing Airtable base. Dedup checks
//! walk every page of the configured view and compare
//! `mentioned_conversation_tweet_id`; there is no indexed lookup.

use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::Ledger;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::types::ReplyRecord;

const PAGE_SIZE: &str = "100";

pub struct AirtableLedger {
    client: Client,
    table_url: String,
    view: String,
    token: String,
}

#[derive(Deserialize)]
struct RecordPage {
    #[serde(default)]
    records: Vec<AirtableRecord>,
    offset: Option<String>,
}

#[derive(Deserialize)]
struct AirtableRecord {
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
struct CreateRecord<'a> {
    fields: ReplyFields<'a>,
    typecast: bool,
}

#[derive(Serialize)]
struct ReplyFields<'a> {
    mentioned_conversation_tweet_id: &'a str,
    mentioned_conversation_tweet_text: &'a str,
    tweet_response_id: &'a str,
    tweet_response_text: &'a str,
    tweet_response_created_at: String,
    mentioned_at: String,
}

impl<'a> From<&'a ReplyRecord> for ReplyFields<'a> {
    fn from(r: &'a ReplyRecord) -> Self {
        Self {
            mentioned_conversation_tweet_id: &r.source_post_id,
            mentioned_conversation_tweet_text: &r.source_post_text,
            tweet_response_id: &r.reply_post_id,
            tweet_response_text: &r.reply_text,
            tweet_response_created_at: r.replied_at.to_rfc3339(),
            mentioned_at: r.mentioned_at.to_rfc3339(),
        }
    }
}

impl AirtableLedger {
    pub fn new(config: &LedgerConfig, token: &str) -> anyhow::Result<Self> {
        anyhow::ensure!(
            !config.airtable_base_id.is_empty(),
            "ledger.airtable_base_id must be set for the airtable backend"
        );
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build Airtable HTTP client")?;

        Ok(Self {
            client,
            table_url: format!(
                "{}/{}/{}",
                config.airtable_base_url.trim_end_matches('/'),
                config.airtable_base_id,
                config.airtable_table
            ),
            view: config.airtable_view.clone(),
            token: token.to_string(),
        })
    }

    fn fetch_page(&self, offset: Option<&str>) -> Result<RecordPage, LedgerError> {
        let mut query = vec![("view", self.view.as_str()), ("pageSize", PAGE_SIZE)];
        if let Some(offset) = offset {
            query.push(("offset", offset));
        }

        let response = self
            .client
            .get(&self.table_url)
            .bearer_auth(&self.token)
            .query(&query)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LedgerError::Remote(format!("HTTP {}: {body}", status.as_u16())));
        }
        Ok(response.json()?)
    }
}

impl Ledger for AirtableLedger {
    fn has_replied(&self, source_post_id: &str) -> Result<bool, LedgerError> {
        let mut offset: Option<String> = None;
        let mut scanned = 0usize;

        loop {
            let page = self.fetch_page(offset.as_deref())?;
            scanned += page.records.len();
            if page_contains(&page, source_post_id) {
                return Ok(true);
            }
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        tracing::debug!(scanned, source_post_id, "airtable ledger scanned without match");
        Ok(false)
    }

    fn record(&self, reply: &ReplyRecord) -> Result<(), LedgerError> {
        let response = self
            .client
            .post(&self.table_url)
            .bearer_auth(&self.token)
            .json(&CreateRecord {
                fields: ReplyFields::from(reply),
                typecast: true,
            })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LedgerError::Remote(format!("HTTP {}: {body}", status.as_u16())));
        }
        Ok(())
    }
}

/// Ids may have been stored as text or numbers; compare their string forms.
fn page_contains(page: &RecordPage, source_post_id: &str) -> bool {
    page.records.iter().any(|record| {
        match record.fields.get("mentioned_conversation_tweet_id") {
            Some(serde_json::Value::String(s)) => s == source_post_id,
            Some(serde_json::Value::Number(n)) => n.to_string() == source_post_id,
            _ => false,
        }
    })
}
