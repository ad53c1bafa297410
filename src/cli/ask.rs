use anyhow::{Context, Result};

use threadwise::bot;
use threadwise::config::BotConfig;

/// Answer a question from the terminal without touching the platform or ledger.
pub async fn ask(config: BotConfig, question: String) -> Result<()> {
    let answer = tokio::task::spawn_blocking(move || -> Result<_> {
        let synthesizer = bot::build_synthesizer(&config)?;
        Ok(synthesizer.answer(&question)?)
    })
    .await
    .context("answer task failed")??;

    println!("{}", answer.text);
    println!();
    println!("({} characters)", answer.text.chars().count());
    if answer.sources.is_empty() {
        println!("Sources: none");
    } else {
        println!("Sources: {}", answer.sources.join(", "));
    }
    Ok(())
}
