//! Semantic search over the persisted vector store

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::text::truncate_chars;
use crate::types::{Chunk, RetrievedText};

use super::store::VectorStore;

/// Embeds queries and looks them up in a fresh snapshot of the store
pub struct Retriever {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl Retriever {
    /// Create a retriever over `store`
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    /// Top-`k` chunks for `query` with their similarity.
    ///
    /// The index is reloaded from disk on every call; `None` means no
    /// index has been persisted yet.
    pub async fn search(&self, query: &str, k: usize) -> Result<Option<Vec<(Chunk, f32)>>> {
        let store = self.store.clone();
        let snapshot = tokio::task::spawn_blocking(move || store.load_snapshot())
            .await
            .map_err(|e| Error::internal(format!("Index load task failed: {}", e)))??;

        let Some(index) = snapshot else {
            return Ok(None);
        };

        if index.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let query_embedding = self.embedder.embed(query).await?;
        let results = index.similarity_search_with_score(&query_embedding, k)?;

        tracing::debug!(
            "Search over {} chunks returned {} results",
            index.len(),
            results.len()
        );

        Ok(Some(results))
    }

    /// Plain semantic search for the `/search` endpoint.
    ///
    /// Never fails: errors are logged and produce an empty list.
    pub async fn retrieve_relevant_text(&self, query: &str, top_k: usize) -> Vec<RetrievedText> {
        match self.search(query, top_k).await {
            Ok(Some(results)) => results
                .into_iter()
                .map(|(chunk, score)| RetrievedText {
                    content: truncate_chars(&chunk.content, self.config.search_content_chars)
                        .to_string(),
                    relevance_score: round_score(score),
                    source: chunk.source_or_unknown().to_string(),
                })
                .collect(),
            Ok(None) => {
                tracing::info!("Search requested before any document was indexed");
                Vec::new()
            }
            Err(e) => {
                tracing::error!("Error retrieving relevant text: {}", e);
                Vec::new()
            }
        }
    }

    /// Default result count for `/search`
    pub fn default_top_k(&self) -> usize {
        self.config.search_top_k
    }
}

/// Round to three decimals
fn round_score(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}
