//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::QueryHandler;
use crate::ingestion::{FileParser, IngestPipeline, TextChunker};
use crate::providers::{self, EmbeddingProvider, LlmProvider};
use crate::retrieval::{IndexParams, Retriever, VectorStore};
use crate::storage::{DocumentRegistry, REGISTRY_FILE};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Upload handling
    pipeline: IngestPipeline,
    /// Semantic search over the persisted index
    retriever: Arc<Retriever>,
    /// Retrieval plus generation
    query_handler: QueryHandler,
    /// Document registry (persisted to disk)
    registry: Arc<DocumentRegistry>,
    /// Embedding provider (Ollama or hashing)
    embedding_provider: Arc<dyn EmbeddingProvider>,
    /// LLM provider
    llm_provider: Arc<dyn LlmProvider>,
}

impl AppState {
    /// Create new application state with the configured providers
    pub async fn new(config: RagConfig) -> Result<Self> {
        let (embedder, llm) = providers::from_config(&config)?;
        Self::with_providers(config, embedder, llm)
    }

    /// Create application state around explicit providers
    pub fn with_providers(
        config: RagConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        tracing::info!(
            "Initializing RAG application state (embeddings: {} / {} dims, llm: {} / {})",
            embedding_provider.name(),
            embedding_provider.dimensions(),
            llm_provider.name(),
            llm_provider.model()
        );

        std::fs::create_dir_all(&config.storage.upload_dir)?;

        let params = IndexParams {
            max_connections: config.retrieval.hnsw_m,
            ef_construction: config.retrieval.hnsw_ef_construction,
        };
        let store = Arc::new(VectorStore::open(&config.storage.index_dir, params)?);
        tracing::info!("Vector store opened at {}", config.storage.index_dir.display());

        let registry = Arc::new(DocumentRegistry::new(
            config.storage.index_dir.join(REGISTRY_FILE),
        )?);
        tracing::info!("Document registry loaded ({} documents)", registry.count()?);

        let pipeline = IngestPipeline::new(
            FileParser::new(&config.ingestion),
            TextChunker::from_config(&config.chunking),
            embedding_provider.clone(),
            store.clone(),
            registry.clone(),
            config.storage.upload_dir.clone(),
        );

        let retriever = Arc::new(Retriever::new(
            store,
            embedding_provider.clone(),
            config.retrieval.clone(),
        ));

        let query_handler = QueryHandler::new(
            retriever.clone(),
            llm_provider.clone(),
            config.retrieval.clone(),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                retriever,
                query_handler,
                registry,
                embedding_provider,
                llm_provider,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get ingestion pipeline
    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    /// Get retriever
    pub fn retriever(&self) -> &Retriever {
        &self.inner.retriever
    }

    /// Get query handler
    pub fn query_handler(&self) -> &QueryHandler {
        &self.inner.query_handler
    }

    /// Get document registry
    pub fn registry(&self) -> &DocumentRegistry {
        &self.inner.registry
    }

    /// Ready when both providers answer their health checks
    pub async fn is_ready(&self) -> bool {
        let embeddings = match self.inner.embedding_provider.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!("Embedding provider health check failed: {}", e);
                false
            }
        };
        let llm = match self.inner.llm_provider.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!("LLM provider health check failed: {}", e);
                false
            }
        };

        embeddings && llm
    }
}
