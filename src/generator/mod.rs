//! Language-model text generation.
//!
//! A [`Generator`] maps a fully formed [`Prompt`] to text. Output length is
//! steered by the prompt's instructions, never truncated here, and repeated
//! calls with the same prompt may return different text.

pub mod openai;

use crate::error::GenerationError;

/// A fully formed prompt: fixed instructions plus the user's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Persona, format rules and grounding context.
    pub system: String,
    /// The text being answered.
    pub user: String,
}

impl Prompt {
    /// Single-string rendering for generators without message roles.
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.system.trim_end(), self.user)
    }
}

pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError>;
}

/// Create the configured generator.
pub fn create_generator(
    config: &crate::config::LlmConfig,
    api_key: &str,
) -> anyhow::Result<Box<dyn Generator>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(openai::OpenAiGenerator::new(config, api_key)?)),
        other => anyhow::bail!("unknown generation provider: {other}. Supported: openai"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_joins_system_and_user() {
        let prompt = Prompt {
            system: "Be brief.\n".into(),
            user: "Why?".into(),
        };
        assert_eq!(prompt.render(), "Be brief.\n\nWhy?");
    }
}
