mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use threadwise::config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "threadwise", version, about = "Scheduled mention-reply bot with grounded answers")]
struct Cli {
    /// Config file (defaults to ~/.threadwise/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll for mentions on a fixed interval until interrupted
    Run,
    /// Run a single reply cycle and print its summary
    Once {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Answer a question with the knowledge base, without posting
    Ask { question: String },
    /// Manage the knowledge index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Show recent ledger records (sqlite backend)
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// Chunk, embed and store plain-text corpus files
    Build {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::BotConfig::load_from(path)?,
        None => config::BotConfig::load()?,
    };

    // Log to stderr so stdout stays clean for summaries and JSON.
    let filter = EnvFilter::try_new(&config.bot.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run => cli::run::run(config).await?,
        Command::Once { json } => cli::run::once(config, json).await?,
        Command::Ask { question } => cli::ask::ask(config, question).await?,
        Command::Index { action } => match action {
            IndexAction::Build { files } => cli::index::build(config, files).await?,
        },
        Command::History { limit } => cli::history::history(&config, limit)?,
    }

    Ok(())
}
