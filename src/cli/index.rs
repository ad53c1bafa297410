//! CLI `index build` command: chunk, embed and store corpus files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use threadwise::config::BotConfig;
use threadwise::index::chunker::ChunkOptions;
use threadwise::{db, embedding, index};

pub async fn build(config: BotConfig, files: Vec<PathBuf>) -> Result<()> {
    tokio::task::spawn_blocking(move || build_blocking(&config, &files))
        .await
        .context("index task failed")?
}

fn build_blocking(config: &BotConfig, files: &[PathBuf]) -> Result<()> {
    config.validate()?;
    let api_key = config.credentials.openai_api_key()?;
    let provider = embedding::create_provider(&config.llm, api_key)?;

    let index_path = config.resolved_index_path();
    let mut conn = db::open_index_database(&index_path, provider.dimensions())?;

    let opts = ChunkOptions {
        separator: "\n",
        chunk_size: config.index.chunk_size,
        overlap: config.index.chunk_overlap,
    };

    for path in files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        println!("Indexing {source}...");
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner} {pos} chunks embedded")
                .expect("valid template"),
        );

        let report = index::index_document(
            &mut conn,
            provider.as_ref(),
            &source,
            &text,
            &opts,
            |n| pb.inc(n as u64),
        )?;
        pb.finish_and_clear();

        if report.replaced > 0 {
            println!(
                "  {} chunks stored ({} from a previous build replaced)",
                report.chunks, report.replaced
            );
        } else {
            println!("  {} chunks stored", report.chunks);
        }
    }

    println!(
        "Index at {} now holds {} chunks.",
        index_path.display(),
        index::chunk_count(&conn)?
    );
    Ok(())
}
