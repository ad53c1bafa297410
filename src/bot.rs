//! Wiring: build the orchestrator and its collaborators from configuration.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::BotConfig;
use crate::embedding::{self, EmbeddingProvider};
use crate::generator::{self, Generator};
use crate::ledger::{self, Ledger};
use crate::orchestrator::ReplyOrchestrator;
use crate::platform::twitter::TwitterClient;
use crate::retriever::{Retriever, VectorRetriever};
use crate::scanner::MentionScanner;
use crate::synthesizer::AnswerSynthesizer;
use crate::{db, index};

/// Open the knowledge index and build the retriever + generator pair.
pub fn build_synthesizer(config: &BotConfig) -> Result<AnswerSynthesizer> {
    let api_key = config.credentials.openai_api_key()?;

    let provider = embedding::create_provider(&config.llm, api_key)?;
    let embedding: Arc<dyn EmbeddingProvider> = Arc::from(provider);

    let index_path = config.resolved_index_path();
    let conn = db::open_index_database(&index_path, embedding.dimensions())?;

    let chunks = index::chunk_count(&conn)?;
    if chunks == 0 {
        tracing::warn!(
            index = %index_path.display(),
            "knowledge index is empty; run `threadwise index build <file>` first"
        );
    }
    if let Some(stored) = db::get_meta(&conn, "embedding_model")? {
        if stored != embedding.model() {
            tracing::warn!(
                stored = %stored,
                configured = %embedding.model(),
                "embedding model changed since the index was built; rebuild it"
            );
        }
    }
    tracing::info!(chunks, "knowledge index ready");

    let retriever: Arc<dyn Retriever> =
        Arc::new(VectorRetriever::new(conn, embedding, config.index.top_k));
    let generator: Arc<dyn Generator> =
        Arc::from(generator::create_generator(&config.llm, api_key)?);

    Ok(AnswerSynthesizer::new(retriever, generator))
}

/// Build a ready-to-run orchestrator. Looks up the bot's account id on the platform.
pub fn build_orchestrator(config: &BotConfig) -> Result<ReplyOrchestrator> {
    config.validate()?;

    let twitter = Arc::new(TwitterClient::new(
        &config.twitter,
        config.credentials.twitter_access_token()?,
    )?);
    let account_id = twitter
        .me_id()
        .context("failed to look up the bot's account id")?;
    tracing::info!(account_id = %account_id, "platform account resolved");

    let ledger: Arc<dyn Ledger> = Arc::from(ledger::create_ledger(
        &config.ledger,
        &config.resolved_ledger_path(),
        &config.credentials,
    )?);
    tracing::info!(backend = %config.ledger.backend, "ledger ready");

    let synthesizer = build_synthesizer(config)?;
    let scanner = MentionScanner::new(twitter.clone(), account_id, config.lookback_window());

    Ok(ReplyOrchestrator::new(
        scanner,
        synthesizer,
        twitter,
        ledger,
        config.bot.response_limit,
    ))
}
