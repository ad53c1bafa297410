//! Retrieval-grounded answer synthesis.
//!
//! [`AnswerSynthesizer::answer`] retrieves passages once, builds a prompt from
//! the fixed persona, the passages and the question, and returns the
//! generator's text unmodified. The "around 200 characters" rule lives in the
//! prompt only; nothing here enforces it.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::SynthesisError;
use crate::generator::{Generator, Prompt};
use crate::retriever::Retriever;
use crate::types::{Answer, Passage};

/// The bot's fixed voice and reply format.
pub const PERSONA_INSTRUCTIONS: &str = "\
You are a non-binary bot and a patient teacher on gender and sex.
Your goal is to give a knowledgeable answer in response to a piece of text from the user.

% RESPONSE TONE:

- Your response should be informative and helpful.
- Do not respond if you do not have enough information to give a proper response.

% RESPONSE FORMAT:

- Respond in around 200 characters.
- Respond in a single paragraph.
- Do not phrase the response as a question.

% RESPONSE CONTENT:

- Ground the response in the context passages below.
- If you are unsure or the context is not enough, you can say \"I don't know\" or \"I'm not sure\", but try to lead the user toward a relevant answer.
- Never reply with anything racist, sexist, homophobic, transphobic or otherwise offensive.
";

const NO_CONTEXT: &str = "No relevant passages were found in the knowledge base.";

pub struct AnswerSynthesizer {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
}

impl AnswerSynthesizer {
    pub fn new(retriever: Arc<dyn Retriever>, generator: Arc<dyn Generator>) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    /// Answer `question` in the bot's voice. Retrieval and generation errors propagate.
    pub fn answer(&self, question: &str) -> Result<Answer, SynthesisError> {
        let passages = self.retriever.retrieve(question)?;
        let prompt = build_prompt(&passages, question);
        let text = self.generator.generate(&prompt)?;

        tracing::debug!(
            passages = passages.len(),
            answer_len = text.chars().count(),
            "answer generated"
        );

        Ok(Answer {
            text,
            sources: distinct_sources(&passages),
        })
    }
}

/// Persona + numbered context passages with their sources, then the question.
pub fn build_prompt(passages: &[Passage], question: &str) -> Prompt {
    let mut system = String::from(PERSONA_INSTRUCTIONS);
    system.push_str("\n% CONTEXT:\n\n");

    if passages.is_empty() {
        system.push_str(NO_CONTEXT);
        system.push('\n');
    }
    for (i, passage) in passages.iter().enumerate() {
        let _ = writeln!(
            system,
            "[{}] (source: {})\n{}\n",
            i + 1,
            passage.source,
            passage.content.trim()
        );
    }

    Prompt {
        system,
        user: question.to_string(),
    }
}

fn distinct_sources(passages: &[Passage]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for passage in passages {
        if !sources.contains(&passage.source) {
            sources.push(passage.source.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerationError, RetrievalError};
    use std::sync::Mutex;

    struct StaticRetriever(Vec<Passage>);

    impl Retriever for StaticRetriever {
        fn retrieve(&self, _question: &str) -> Result<Vec<Passage>, RetrievalError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenRetriever;

    impl Retriever for BrokenRetriever {
        fn retrieve(&self, _question: &str) -> Result<Vec<Passage>, RetrievalError> {
            Err(RetrievalError::Unavailable("index offline".into()))
        }
    }

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<Prompt>>,
        fail: bool,
    }

    impl Generator for RecordingGenerator {
        fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.clone());
            if self.fail {
                Err(GenerationError::Other("timeout".into()))
            } else {
                Ok("Gender identity is a person's internal sense of self.".into())
            }
        }
    }

    fn passage(content: &str, source: &str) -> Passage {
        Passage {
            content: content.into(),
            source: source.into(),
        }
    }

    #[test]
    fn prompt_contains_persona_context_and_question() {
        let prompt = build_prompt(
            &[passage("Identity is internal.", "gender.txt")],
            "What is gender identity?",
        );
        assert!(prompt.system.starts_with("You are a non-binary bot"));
        assert!(prompt.system.contains("[1] (source: gender.txt)\nIdentity is internal."));
        assert_eq!(prompt.user, "What is gender identity?");
    }

    #[test]
    fn prompt_without_passages_says_so() {
        let prompt = build_prompt(&[], "anything");
        assert!(prompt.system.contains(NO_CONTEXT));
    }

    #[test]
    fn answer_returns_generator_text_verbatim() {
        let generator = Arc::new(RecordingGenerator::default());
        let synthesizer = AnswerSynthesizer::new(
            Arc::new(StaticRetriever(vec![
                passage("a", "one.txt"),
                passage("b", "two.txt"),
                passage("c", "one.txt"),
            ])),
            generator.clone(),
        );

        let answer = synthesizer.answer("What is gender identity?").unwrap();
        assert_eq!(
            answer.text,
            "Gender identity is a person's internal sense of self."
        );
        assert_eq!(answer.sources, vec!["one.txt", "two.txt"]);
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
    }

    #[test]
    fn retrieval_failure_skips_generation() {
        let generator = Arc::new(RecordingGenerator::default());
        let synthesizer = AnswerSynthesizer::new(Arc::new(BrokenRetriever), generator.clone());

        let err = synthesizer.answer("q").unwrap_err();
        assert!(matches!(err, SynthesisError::Retrieval(_)));
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn generation_failure_propagates() {
        let generator = Arc::new(RecordingGenerator {
            fail: true,
            ..Default::default()
        });
        let synthesizer = AnswerSynthesizer::new(Arc::new(StaticRetriever(vec![])), generator);

        let err = synthesizer.answer("q").unwrap_err();
        assert!(matches!(err, SynthesisError::Generation(_)));
    }
}
