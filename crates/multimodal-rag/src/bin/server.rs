//! Multimodal RAG server binary
//!
//! Run with: cargo run -p multimodal-rag --bin multimodal-rag-server

use multimodal_rag::{
    config::{EmbeddingBackend, RagConfig},
    generation::OllamaClient,
    ingestion::TesseractOcr,
    server::RagServer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "multimodal_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                    Multimodal RAG API                     ║
║          Ask questions about text, PDFs and images        ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embeddings: {:?} ({} dimensions)", config.embeddings.provider, config.embeddings.dimensions);
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);
    tracing::info!("  - Uploads: {}", config.storage.upload_dir.display());
    tracing::info!("  - Index: {}", config.storage.index_dir.display());

    // Check Ollama
    tracing::info!("Checking Ollama at {}...", config.llm.base_url);
    let client = OllamaClient::new(&config.llm)?;
    if client.health_check().await? {
        tracing::info!("Ollama is running");
    } else {
        tracing::warn!("Ollama not available at {}", config.llm.base_url);
        tracing::warn!("Please start Ollama:");
        tracing::warn!("  1. Start: ollama serve");
        if config.embeddings.provider == EmbeddingBackend::Ollama {
            tracing::warn!("  2. Pull models: ollama pull {} && ollama pull {}", config.llm.embed_model, config.llm.generate_model);
        } else {
            tracing::warn!("  2. Pull model: ollama pull {}", config.llm.generate_model);
        }
    }

    // Check tesseract
    let ocr = TesseractOcr::new(&config.ingestion.tesseract_cmd, &config.ingestion.ocr_language);
    if !ocr.is_available() {
        tracing::warn!(
            "'{}' not found; image uploads will fail until tesseract is installed",
            config.ingestion.tesseract_cmd
        );
    }

    // Create and start server
    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /upload/file - Upload a document");
    println!("  POST /query       - Ask a question");
    println!("  POST /search      - Search indexed chunks");
    println!("  GET  /documents   - List documents");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
