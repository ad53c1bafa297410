#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use threadwise::embedding::EmbeddingProvider;
use threadwise::error::{GenerationError, LedgerError, PlatformError, RetrievalError};
use threadwise::generator::{Generator, Prompt};
use threadwise::ledger::{Ledger, SqliteLedger};
use threadwise::orchestrator::ReplyOrchestrator;
use threadwise::platform::{MentionSource, Publisher};
use threadwise::retriever::Retriever;
use threadwise::scanner::MentionScanner;
use threadwise::synthesizer::AnswerSynthesizer;
use threadwise::types::{ConversationRoot, Mention, Passage, ReplyRecord};

pub const ACCOUNT: &str = "bot";

/// Fixed reference time for deterministic windows.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn mention(id: &str, conversation_id: &str, created_at: DateTime<Utc>) -> Mention {
    Mention {
        id: id.into(),
        conversation_id: Some(conversation_id.into()),
        created_at,
        author_id: Some("author".into()),
    }
}

pub fn root(id: &str, text: &str) -> ConversationRoot {
    ConversationRoot {
        id: id.into(),
        text: text.into(),
        created_at: None,
    }
}

// ── Platform ──────────────────────────────────────────────────────────────────

/// In-memory platform: filters mentions by `since` the way the real API does.
#[derive(Default)]
pub struct FakePlatform {
    pub mentions: Mutex<Vec<Mention>>,
    pub posts: Mutex<HashMap<String, ConversationRoot>>,
    pub fail_scan: Mutex<bool>,
    pub scan_calls: Mutex<Vec<DateTime<Utc>>>,
    pub lookups: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn add_mention(&self, mention: Mention) {
        self.mentions.lock().unwrap().push(mention);
    }

    pub fn add_post(&self, post: ConversationRoot) {
        self.posts.lock().unwrap().insert(post.id.clone(), post);
    }

    /// A mention of `root_id` whose root post exists.
    pub fn add_reply_mention(&self, id: &str, root_id: &str, text: &str, at: DateTime<Utc>) {
        self.add_post(root(root_id, text));
        self.add_mention(mention(id, root_id, at));
    }

    pub fn set_fail_scan(&self, fail: bool) {
        *self.fail_scan.lock().unwrap() = fail;
    }
}

impl MentionSource for FakePlatform {
    fn mentions_since(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Mention>, PlatformError> {
        assert_eq!(account_id, ACCOUNT);
        self.scan_calls.lock().unwrap().push(since);
        if *self.fail_scan.lock().unwrap() {
            return Err(PlatformError::Status {
                status: 401,
                body: "Unauthorized".into(),
            });
        }
        Ok(self
            .mentions
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.created_at >= since)
            .cloned()
            .collect())
    }

    fn get_post(&self, id: &str) -> Result<Option<ConversationRoot>, PlatformError> {
        self.lookups.lock().unwrap().push(id.to_string());
        Ok(self.posts.lock().unwrap().get(id).cloned())
    }
}

/// Records every publish call; fails for mention ids in `fail_for`.
#[derive(Default)]
pub struct FakePublisher {
    pub published: Mutex<Vec<(String, String)>>,
    pub fail_for: Mutex<HashSet<String>>,
    next_id: Mutex<u64>,
}

impl FakePublisher {
    pub fn fail_for(&self, mention_id: &str) {
        self.fail_for.lock().unwrap().insert(mention_id.to_string());
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn replied_to(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, to)| to).collect()
    }
}

impl Publisher for FakePublisher {
    fn create_reply(&self, text: &str, in_reply_to: &str) -> Result<String, PlatformError> {
        if self.fail_for.lock().unwrap().contains(in_reply_to) {
            return Err(PlatformError::Rejected("duplicate content".into()));
        }
        self.published
            .lock()
            .unwrap()
            .push((text.to_string(), in_reply_to.to_string()));
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = *next;
        Ok(format!("reply-{id}"))
    }
}

// ── Answering ─────────────────────────────────────────────────────────────────

pub struct FakeRetriever {
    pub passages: Vec<Passage>,
    pub fail_on: Mutex<HashSet<String>>,
}

impl FakeRetriever {
    pub fn with_passage(content: &str, source: &str) -> Self {
        Self {
            passages: vec![Passage {
                content: content.into(),
                source: source.into(),
            }],
            fail_on: Mutex::default(),
        }
    }
}

impl Retriever for FakeRetriever {
    fn retrieve(&self, question: &str) -> Result<Vec<Passage>, RetrievalError> {
        if self.fail_on.lock().unwrap().contains(question) {
            return Err(RetrievalError::Unavailable("index offline".into()));
        }
        Ok(self.passages.clone())
    }
}

pub struct FakeGenerator {
    pub reply: String,
    pub prompts: Mutex<Vec<Prompt>>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.into(),
            prompts: Mutex::default(),
        }
    }
}

impl Generator for FakeGenerator {
    fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        Ok(self.reply.clone())
    }
}

// ── Ledger ────────────────────────────────────────────────────────────────────

pub fn sqlite_ledger() -> Arc<SqliteLedger> {
    Arc::new(SqliteLedger::new(
        threadwise::db::open_ledger_in_memory().unwrap(),
    ))
}

/// Wraps a real ledger and fails writes (or checks) for chosen roots.
pub struct FlakyLedger {
    pub inner: Arc<SqliteLedger>,
    pub fail_writes: Mutex<HashSet<String>>,
    pub fail_checks: Mutex<HashSet<String>>,
    pub checks: Mutex<Vec<String>>,
}

impl FlakyLedger {
    pub fn new(inner: Arc<SqliteLedger>) -> Self {
        Self {
            inner,
            fail_writes: Mutex::default(),
            fail_checks: Mutex::default(),
            checks: Mutex::default(),
        }
    }
}

impl Ledger for FlakyLedger {
    fn has_replied(&self, source_post_id: &str) -> Result<bool, LedgerError> {
        self.checks.lock().unwrap().push(source_post_id.to_string());
        if self.fail_checks.lock().unwrap().contains(source_post_id) {
            return Err(LedgerError::Unavailable("store offline".into()));
        }
        self.inner.has_replied(source_post_id)
    }

    fn record(&self, reply: &ReplyRecord) -> Result<(), LedgerError> {
        if self.fail_writes.lock().unwrap().contains(&reply.source_post_id) {
            return Err(LedgerError::Unavailable("store offline".into()));
        }
        self.inner.record(reply)
    }
}

pub fn existing_record(source_post_id: &str) -> ReplyRecord {
    ReplyRecord {
        source_post_id: source_post_id.into(),
        source_post_text: "earlier question".into(),
        reply_post_id: "old-reply".into(),
        reply_text: "earlier answer".into(),
        replied_at: t0() - Duration::days(1),
        mentioned_at: t0() - Duration::days(1),
    }
}

// ── Embeddings ────────────────────────────────────────────────────────────────

pub const TEST_DIM: usize = 8;

/// Deterministic embedder: one-hot on the first keyword found, else dimension 0.
pub struct KeywordEmbedder {
    pub keywords: Vec<&'static str>,
}

impl EmbeddingProvider for KeywordEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let slot = self
                    .keywords
                    .iter()
                    .position(|k| lower.contains(k))
                    .map(|i| i + 1)
                    .unwrap_or(0);
                let mut v = vec![0.0f32; TEST_DIM];
                v[slot % TEST_DIM] = 1.0;
                v
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        TEST_DIM
    }

    fn model(&self) -> &str {
        "keyword-test"
    }
}

// ── Assembly ──────────────────────────────────────────────────────────────────

pub struct Harness {
    pub platform: Arc<FakePlatform>,
    pub publisher: Arc<FakePublisher>,
    pub retriever: Arc<FakeRetriever>,
    pub generator: Arc<FakeGenerator>,
    pub ledger: Arc<FlakyLedger>,
    pub store: Arc<SqliteLedger>,
    pub orchestrator: ReplyOrchestrator,
}

impl Harness {
    pub fn new(window: Duration, response_limit: usize) -> Self {
        let platform = Arc::new(FakePlatform::default());
        let publisher = Arc::new(FakePublisher::default());
        let retriever = Arc::new(FakeRetriever::with_passage(
            "Gender identity is a person's internal sense of their gender.",
            "corpus.txt",
        ));
        let generator = Arc::new(FakeGenerator::replying("Gender identity is..."));
        let store = sqlite_ledger();
        let ledger = Arc::new(FlakyLedger::new(store.clone()));

        let scanner = MentionScanner::new(platform.clone(), ACCOUNT, window);
        let synthesizer = AnswerSynthesizer::new(retriever.clone(), generator.clone());
        let orchestrator = ReplyOrchestrator::new(
            scanner,
            synthesizer,
            publisher.clone(),
            ledger.clone(),
            response_limit,
        );

        Self {
            platform,
            publisher,
            retriever,
            generator,
            ledger,
            store,
            orchestrator,
        }
    }

    /// 20-minute window, cap of 10.
    pub fn default_settings() -> Self {
        Self::new(Duration::minutes(20), 10)
    }
}
