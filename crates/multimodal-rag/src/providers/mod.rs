//! Provider abstractions for embeddings and LLM generation
//!
//! Trait-based so the pipeline can switch between a live Ollama backend and
//! the offline hashing embedder.

pub mod embedding;
pub mod hashing;
pub mod llm;
pub mod ollama;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, RagConfig};
use crate::error::Result;
use crate::generation::OllamaClient;

pub use embedding::EmbeddingProvider;
pub use hashing::HashingEmbedder;
pub use llm::LlmProvider;
pub use ollama::{OllamaEmbedder, OllamaLlm};

/// Build the embedding and LLM providers selected by `config`
pub fn from_config(
    config: &RagConfig,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>)> {
    let client = Arc::new(OllamaClient::new(&config.llm)?);

    let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.provider {
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::from_client(
            client.clone(),
            config.embeddings.dimensions,
        )),
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.embeddings.dimensions)),
    };

    let llm: Arc<dyn LlmProvider> = Arc::new(OllamaLlm::from_client(
        client,
        config.llm.generate_model.clone(),
    ));

    Ok((embedder, llm))
}
