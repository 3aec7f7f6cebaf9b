//! Query answering: retrieve, build the prompt, generate

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::providers::LlmProvider;
use crate::retrieval::Retriever;
use crate::text::{clean_text, truncate_chars};
use crate::types::{QueryResponse, TopResult};

use super::prompt::PromptBuilder;

/// Answers questions from indexed documents
pub struct QueryHandler {
    retriever: Arc<Retriever>,
    llm: Arc<dyn LlmProvider>,
    config: RetrievalConfig,
}

impl QueryHandler {
    /// Create a new query handler
    pub fn new(retriever: Arc<Retriever>, llm: Arc<dyn LlmProvider>, config: RetrievalConfig) -> Self {
        Self {
            retriever,
            llm,
            config,
        }
    }

    /// Answer `query` from the most relevant chunks.
    ///
    /// A missing index or an empty result is reported in the response body;
    /// a generation failure becomes the answer text instead of an error.
    pub async fn answer_query(&self, query: &str) -> Result<QueryResponse> {
        if query.trim().is_empty() {
            return Err(Error::InvalidRequest("Query text is empty".to_string()));
        }

        let Some(results) = self.retriever.search(query, self.config.answer_top_k).await? else {
            return Ok(QueryResponse::no_vector_store());
        };

        if results.is_empty() {
            return Ok(QueryResponse::no_relevant_content());
        }

        let context =
            PromptBuilder::build_context(results.iter().map(|(chunk, _)| chunk), self.config.max_context_chars);
        let prompt = PromptBuilder::build_answer_prompt(&context, query);

        let answer = match self.llm.generate(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Generation with {} failed: {}", self.llm.model(), e);
                format!("(Error while generating answer: {})", e)
            }
        };

        let top_results = results
            .iter()
            .map(|(chunk, score)| TopResult {
                source: chunk.source_or_unknown().to_string(),
                relevance: *score,
                snippet: clean_text(truncate_chars(&chunk.content, self.config.snippet_chars)),
            })
            .collect();

        tracing::info!("Answered query with {} context chunks", results.len());

        Ok(QueryResponse::answered(
            query.to_string(),
            clean_text(&answer),
            top_results,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{EmbeddingProvider, HashingEmbedder};
    use crate::retrieval::{IndexParams, VectorStore};
    use crate::types::Chunk;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tempfile::TempDir;
    use uuid::Uuid;

    /// Returns a fixed reply (or error) and records the prompts it saw
    struct ScriptedLlm {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            self.reply.clone().map_err(Error::Llm)
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-model"
        }
    }

    async fn handler(dir: &TempDir, texts: &[&str], llm: Arc<ScriptedLlm>) -> QueryHandler {
        let store = Arc::new(VectorStore::open(dir.path(), IndexParams::default()).unwrap());
        let embedder = Arc::new(HashingEmbedder::new(128));

        if !texts.is_empty() {
            let doc = Uuid::new_v4();
            let chunks: Vec<Chunk> = texts
                .iter()
                .enumerate()
                .map(|(i, t)| Chunk::new(doc, t.to_string(), None, 0, t.len(), i as u32))
                .collect();
            let contents: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
            store.add(chunks, embedder.embed_batch(&contents).await.unwrap()).unwrap();
        }

        let config = RetrievalConfig::default();
        let retriever = Arc::new(Retriever::new(store, embedder, config.clone()));
        QueryHandler::new(retriever, llm, config)
    }

    #[tokio::test]
    async fn test_no_vector_store() {
        let dir = TempDir::new().unwrap();
        let llm = ScriptedLlm::replying("unused");
        let handler = handler(&dir, &[], llm.clone()).await;

        let response = handler.answer_query("What is Rust?").await.unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["answer"], "No vector store found. Please upload a file first.");
        assert!(llm.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, &["Some text."], ScriptedLlm::replying("x")).await;

        assert!(matches!(
            handler.answer_query("   ").await,
            Err(Error::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_answer_with_sources() {
        let dir = TempDir::new().unwrap();
        let llm = ScriptedLlm::replying("  Paris is the\n capital. See https://example.com ");
        let handler = handler(
            &dir,
            &["Paris is the capital of France.", "Rust has no garbage collector."],
            llm.clone(),
        )
        .await;

        let response = handler.answer_query("capital of France").await.unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["query"], "capital of France");
        assert_eq!(json["generated_answer"], "Paris is the capital. See");

        let top = json["top_results"].as_array().unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0]["source"], "Unknown");
        assert_eq!(top[0]["snippet"], "Paris is the capital of France.");

        let prompts = llm.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Question: capital of France"));
        assert!(prompts[0].contains("Paris is the capital of France."));
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_answer() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, &["Some indexed text."], ScriptedLlm::failing("model offline")).await;

        let response = handler.answer_query("indexed text").await.unwrap();
        assert!(response.is_success());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json["generated_answer"],
            "(Error while generating answer: LLM error: model offline)"
        );
    }
}
