//! Scheduled mention-reply bot with retrieval-grounded answers.
//!
//! Every cycle, threadwise scans the bot account's recent mentions, resolves
//! each to the post it was attached to, answers that post from a fixed
//! knowledge corpus, replies under the mention, and records the reply in a
//! durable ledger so the same post is never answered twice.
//!
//! # Pipeline
//!
//! | Stage | Component | Failure handling |
//! |-------|-----------|------------------|
//! | Scan + resolve | [`scanner::MentionScanner`] | scan failure aborts the cycle; unresolved roots are dropped |
//! | Dedup | [`ledger::Ledger`] | check failure skips the mention |
//! | Answer | [`synthesizer::AnswerSynthesizer`] | counted as an error, mention skipped |
//! | Publish | [`platform::Publisher`] | counted as an error, no ledger write |
//! | Record | [`ledger::Ledger`] | logged at error level, not retried |
//!
//! # Modules
//!
//! - [`config`]: Configuration from TOML files and environment variables
//! - [`db`]: SQLite setup for the ledger and the sqlite-vec knowledge index
//! - [`embedding`]: Text-to-vector embedding providers
//! - [`index`]: Corpus chunking and index builds
//! - [`retriever`]: Passage retrieval over the index
//! - [`generator`]: Language-model completion
//! - [`synthesizer`]: Retrieval + generation in the bot's voice
//! - [`platform`]: Mention source and reply publisher (X/Twitter v2)
//! - [`scanner`]: Windowed mention scan and root resolution
//! - [`ledger`]: Reply ledger backends (SQLite, Airtable)
//! - [`orchestrator`]: The per-cycle reply pipeline
//! - [`scheduler`]: Non-overlapping fixed-interval polling

pub mod bot;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod generator;
pub mod index;
pub mod ledger;
pub mod orchestrator;
pub mod platform;
pub mod retriever;
pub mod scanner;
pub mod scheduler;
pub mod synthesizer;
pub mod types;
