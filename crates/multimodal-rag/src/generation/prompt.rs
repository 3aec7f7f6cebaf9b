//! Prompt templates for RAG generation

use crate::text::{clean_text, truncate_chars};
use crate::types::Chunk;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join cleaned chunk contents with single spaces, capped at `max_chars`
    pub fn build_context<'a>(chunks: impl IntoIterator<Item = &'a Chunk>, max_chars: usize) -> String {
        let joined = chunks
            .into_iter()
            .map(|chunk| clean_text(&chunk.content))
            .collect::<Vec<_>>()
            .join(" ");

        truncate_chars(&joined, max_chars).to_string()
    }

    /// Build the answering prompt
    pub fn build_answer_prompt(context: &str, question: &str) -> String {
        format!(
            "You are an intelligent assistant. Use the provided context to answer the user's question accurately, concisely, and relevantly.\n\nContext:\n{}\n\nQuestion: {}\n\nAnswer:",
            context, question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_answer_prompt_layout() {
        let prompt = PromptBuilder::build_answer_prompt("Paris is in France.", "Where is Paris?");

        assert!(prompt.starts_with("You are an intelligent assistant."));
        assert!(prompt.contains("\n\nContext:\nParis is in France.\n\n"));
        assert!(prompt.ends_with("Question: Where is Paris?\n\nAnswer:"));
    }

    #[test]
    fn test_context_cleaned_joined_and_capped() {
        let doc = Uuid::new_v4();
        let chunks = vec![
            Chunk::new(doc, "First\n\nchunk see https://x.io".into(), None, 0, 10, 0),
            Chunk::new(doc, "Second   chunk".into(), None, 10, 20, 1),
        ];

        let context = PromptBuilder::build_context(&chunks, 5000);
        assert_eq!(context, "First chunk see Second chunk");

        let capped = PromptBuilder::build_context(&chunks, 5);
        assert_eq!(capped, "First");
    }
}
