use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BotConfig {
    pub bot: ScheduleConfig,
    pub ledger: LedgerConfig,
    pub index: IndexConfig,
    pub llm: LlmConfig,
    pub twitter: TwitterConfig,
    /// Secrets never come from the config file.
    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
    pub poll_interval_secs: u64,
    pub lookback_window_secs: u64,
    pub response_limit: usize,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LedgerConfig {
    /// `"sqlite"` or `"airtable"`.
    pub backend: String,
    pub db_path: String,
    pub airtable_base_id: String,
    pub airtable_table: String,
    pub airtable_view: String,
    pub airtable_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndexConfig {
    pub db_path: String,
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub base_url: String,
    pub chat_model: String,
    pub temperature: f32,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TwitterConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub twitter_access_token: Option<String>,
    pub airtable_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn mask(v: &Option<String>) -> &'static str {
            if v.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("Credentials")
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("twitter_access_token", &mask(&self.twitter_access_token))
            .field("airtable_token", &mask(&self.airtable_token))
            .finish()
    }
}

impl Credentials {
    /// Read secrets from `OPENAI_API_KEY`, `TWITTER_ACCESS_TOKEN`, `AIRTABLE_TOKEN`.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: non_empty_env("OPENAI_API_KEY"),
            twitter_access_token: non_empty_env("TWITTER_ACCESS_TOKEN"),
            airtable_token: non_empty_env("AIRTABLE_TOKEN"),
        }
    }

    pub fn openai_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .context("OPENAI_API_KEY is not set")
    }

    pub fn twitter_access_token(&self) -> Result<&str> {
        self.twitter_access_token
            .as_deref()
            .context("TWITTER_ACCESS_TOKEN is not set")
    }

    pub fn airtable_token(&self) -> Result<&str> {
        self.airtable_token
            .as_deref()
            .context("AIRTABLE_TOKEN is not set")
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot: ScheduleConfig::default(),
            ledger: LedgerConfig::default(),
            index: IndexConfig::default(),
            llm: LlmConfig::default(),
            twitter: TwitterConfig::default(),
            credentials: Credentials::default(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 6 * 60,
            lookback_window_secs: 20 * 60,
            response_limit: 10,
            log_level: "info".into(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let db_path = default_threadwise_dir()
            .join("ledger.db")
            .to_string_lossy()
            .into_owned();
        Self {
            backend: "sqlite".into(),
            db_path,
            airtable_base_id: String::new(),
            airtable_table: "Replies".into(),
            airtable_view: "Grid view".into(),
            airtable_base_url: "https://api.airtable.com/v0".into(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        let db_path = default_threadwise_dir()
            .join("index.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            top_k: 4,
            chunk_size: 1600,
            chunk_overlap: 100,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            base_url: "https://api.openai.com/v1".into(),
            chat_model: "gpt-4-1106-preview".into(),
            temperature: 0.6,
            embedding_model: "text-embedding-3-small".into(),
            embedding_dim: 1536,
            request_timeout_secs: 60,
        }
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twitter.com".into(),
            request_timeout_secs: 30,
        }
    }
}

/// Returns `~/.threadwise/`
pub fn default_threadwise_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".threadwise")
}

/// Returns the default config file path: `~/.threadwise/config.toml`
pub fn default_config_path() -> PathBuf {
    default_threadwise_dir().join("config.toml")
}

impl BotConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            BotConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides and read credentials.
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("THREADWISE_LEDGER_DB") {
            self.ledger.db_path = val;
        }
        if let Ok(val) = std::env::var("THREADWISE_INDEX_DB") {
            self.index.db_path = val;
        }
        if let Ok(val) = std::env::var("THREADWISE_LOG_LEVEL") {
            self.bot.log_level = val;
        }
        if let Ok(val) = std::env::var("THREADWISE_POLL_SECS") {
            self.bot.poll_interval_secs = val
                .parse()
                .with_context(|| format!("invalid THREADWISE_POLL_SECS: {val}"))?;
        }
        if let Ok(val) = std::env::var("THREADWISE_LOOKBACK_SECS") {
            self.bot.lookback_window_secs = val
                .parse()
                .with_context(|| format!("invalid THREADWISE_LOOKBACK_SECS: {val}"))?;
        }
        if let Ok(val) = std::env::var("THREADWISE_RESPONSE_LIMIT") {
            self.bot.response_limit = val
                .parse()
                .with_context(|| format!("invalid THREADWISE_RESPONSE_LIMIT: {val}"))?;
        }
        self.credentials = Credentials::from_env();
        Ok(())
    }

    /// Reject parameter combinations that would make the bot miss or flood mentions.
    ///
    /// The poll interval must not exceed the lookback window: a mention created
    /// between two polls further apart than the window is never scanned.
    pub fn validate(&self) -> Result<()> {
        if self.bot.poll_interval_secs == 0 {
            bail!("bot.poll_interval_secs must be greater than zero");
        }
        if self.bot.response_limit == 0 {
            bail!("bot.response_limit must be greater than zero");
        }
        if self.bot.poll_interval_secs > self.bot.lookback_window_secs {
            bail!(
                "bot.poll_interval_secs ({}) exceeds bot.lookback_window_secs ({}); \
                 mentions created between polls would be missed",
                self.bot.poll_interval_secs,
                self.bot.lookback_window_secs
            );
        }
        if self.index.chunk_overlap >= self.index.chunk_size {
            bail!(
                "index.chunk_overlap ({}) must be smaller than index.chunk_size ({})",
                self.index.chunk_overlap,
                self.index.chunk_size
            );
        }
        if self.index.top_k == 0 {
            bail!("index.top_k must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.bot.poll_interval_secs)
    }

    pub fn lookback_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.bot.lookback_window_secs as i64)
    }

    pub fn resolved_ledger_path(&self) -> PathBuf {
        expand_tilde(&self.ledger.db_path)
    }

    pub fn resolved_index_path(&self) -> PathBuf {
        expand_tilde(&self.index.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
