//! Ollama-based providers for embeddings and LLM
//!
//! Wraps the shared OllamaClient to implement the provider traits.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::OllamaClient;

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create from existing OllamaClient; `dimensions` is what the model
    /// must return
    pub fn from_client(client: Arc<OllamaClient>, dimensions: usize) -> Self {
        Self { client, dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.client.embed(text).await?;

        if embedding.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "Model '{}' returned {} dimensions, expected {} (check embeddings.dimensions)",
                self.client.embed_model(),
                embedding.len(),
                self.dimensions
            )));
        }

        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaLlm {
    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate(prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use axum::{routing::post, Json, Router};
    use serde_json::json;

    async fn embedder_against(embedding: Vec<f32>, dimensions: usize) -> OllamaEmbedder {
        let router = Router::new().route(
            "/api/embeddings",
            post(move || {
                let embedding = embedding.clone();
                async move { Json(json!({ "embedding": embedding })) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = LlmConfig {
            base_url: format!("http://{}", addr),
            embed_model: "small-embed".to_string(),
            max_retries: 0,
            timeout_secs: 5,
            ..LlmConfig::default()
        };
        OllamaEmbedder::from_client(Arc::new(OllamaClient::new(&config).unwrap()), dimensions)
    }

    #[tokio::test]
    async fn test_embed_matching_dimensions() {
        let embedder = embedder_against(vec![0.5, 0.5, 0.0, 0.1], 4).await;
        assert_eq!(embedder.embed("text").await.unwrap().len(), 4);
        assert_eq!(embedder.dimensions(), 4);
    }

    #[tokio::test]
    async fn test_embed_rejects_wrong_dimensions() {
        let embedder = embedder_against(vec![0.5, 0.5, 0.0], 768).await;

        let err = embedder.embed("text").await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        let message = err.to_string();
        assert!(message.contains("small-embed"));
        assert!(message.contains("returned 3 dimensions, expected 768"));
    }
}
