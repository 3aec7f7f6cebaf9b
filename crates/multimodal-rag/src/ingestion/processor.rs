//! Ingestion pipeline orchestration: save, extract, chunk, embed, index

use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::retrieval::VectorStore;
use crate::storage::DocumentRegistry;
use crate::types::{Document, Status, UploadMetadata, UploadResponse};

use super::chunker::TextChunker;
use super::parser::{ExtractedText, FileParser};

/// Main ingestion pipeline
pub struct IngestPipeline {
    parser: Arc<FileParser>,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<VectorStore>,
    registry: Arc<DocumentRegistry>,
    upload_dir: PathBuf,
    /// One lock per file name so re-uploads of the same file are serialized
    name_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(
        parser: FileParser,
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<VectorStore>,
        registry: Arc<DocumentRegistry>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            parser: Arc::new(parser),
            chunker,
            embedder,
            store,
            registry,
            upload_dir: upload_dir.into(),
            name_locks: DashMap::new(),
        }
    }

    /// Save an uploaded file, extract its text and index it.
    ///
    /// Extraction errors are returned before anything is indexed. A file
    /// re-uploaded under the same name replaces its previous chunks unless
    /// the extracted text is unchanged.
    pub async fn ingest_upload(&self, filename: &str, data: &[u8]) -> Result<UploadResponse> {
        let name = sanitize_filename(filename)?;

        let lock = self
            .name_locks
            .entry(name.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            self.ingest_named(&name, data).await
        };

        // Drop the lock entry once no other upload of this name holds it
        drop(lock);
        self.name_locks
            .remove_if(&name, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    async fn ingest_named(&self, name: &str, data: &[u8]) -> Result<UploadResponse> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let path = self.upload_dir.join(name);
        tokio::fs::write(&path, data).await?;
        let source_path = path.to_string_lossy().to_string();

        tracing::info!("Saved upload {} ({} bytes)", source_path, data.len());

        let extracted = self.extract(path).await?;
        let content_hash = extracted.content_hash();
        let existing = self.registry.find_by_filename(name)?;

        let (document_id, chunks_indexed) = match existing {
            Some(doc) if doc.content_hash == content_hash => {
                tracing::info!("{} unchanged since last upload, skipping re-indexing", name);
                (doc.id, 0)
            }
            previous => {
                let mut doc = Document::new(
                    name.to_string(),
                    extracted.file_type,
                    content_hash,
                    data.len() as u64,
                    source_path.clone(),
                );
                let indexed = self.index_document(&doc, &extracted.full_text).await?;
                doc.total_chunks = indexed as u32;

                if let Some(old) = previous {
                    let removed = self.store.delete_by_document(old.id)?;
                    tracing::info!("Replaced {} chunks of previous upload of {}", removed, name);
                }

                self.registry.upsert(&doc)?;
                (doc.id, indexed)
            }
        };

        Ok(UploadResponse {
            status: Status::Success,
            metadata: UploadMetadata::new(name, &source_path),
            full_text: extracted.full_text,
            content_sample: extracted.content_sample,
            document_id,
            chunks_indexed,
        })
    }

    async fn extract(&self, path: PathBuf) -> Result<ExtractedText> {
        let parser = self.parser.clone();
        tokio::task::spawn_blocking(move || parser.process_file(&path))
            .await
            .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))?
    }

    async fn index_document(&self, doc: &Document, text: &str) -> Result<usize> {
        let chunks = self.chunker.chunk_text(doc.id, Some(&doc.filename), text);
        if chunks.is_empty() {
            return Ok(0);
        }

        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&contents).await?;

        tracing::info!(
            "Indexing {} chunks of {} with {} embeddings",
            chunks.len(),
            doc.filename,
            self.embedder.name()
        );

        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.add(chunks, embeddings))
            .await
            .map_err(|e| Error::internal(format!("Index write task failed: {}", e)))?
    }

    /// Remove a document, its chunks and its saved upload.
    ///
    /// Returns the removed record and how many chunks were dropped.
    pub async fn delete_document(&self, id: Uuid) -> Result<(Document, usize)> {
        let doc = self
            .registry
            .get(id)?
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;

        let removed = self.store.delete_by_document(id)?;
        self.registry.remove(id)?;

        if let Err(e) = tokio::fs::remove_file(&doc.source_path).await {
            tracing::warn!("Could not remove {}: {}", doc.source_path, e);
        }

        tracing::info!("Deleted {} ({} chunks)", doc.filename, removed);
        Ok((doc, removed))
    }
}

/// Reduce a client-supplied name to its final path component
pub fn sanitize_filename(filename: &str) -> Result<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::InvalidRequest(format!(
            "Invalid file name: '{}'",
            filename
        )));
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestionConfig;
    use crate::providers::HashingEmbedder;
    use crate::retrieval::IndexParams;
    use tempfile::TempDir;

    fn pipeline(dir: &TempDir) -> IngestPipeline {
        let config = IngestionConfig {
            tesseract_cmd: "mmrag-test-missing-tesseract".to_string(),
            ..IngestionConfig::default()
        };
        let store = Arc::new(VectorStore::open(dir.path().join("vs"), IndexParams::default()).unwrap());
        let registry = Arc::new(DocumentRegistry::new(dir.path().join("documents.db")).unwrap());

        IngestPipeline::new(
            FileParser::new(&config),
            TextChunker::new(200, 40),
            Arc::new(HashingEmbedder::new(64)),
            store,
            registry,
            dir.path().join("uploads"),
        )
    }

    fn long_text(topic: &str) -> String {
        (0..20)
            .map(|i| format!("Paragraph {} explains {} in some detail.", i, topic))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("notes.txt").unwrap(), "notes.txt");
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\scan.png").unwrap(), "scan.png");
        assert!(sanitize_filename("uploads/").is_err());
        assert!(sanitize_filename("..").is_err());
    }

    #[tokio::test]
    async fn test_ingest_text_upload() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let text = long_text("vector search");

        let response = pipeline.ingest_upload("guide.txt", text.as_bytes()).await.unwrap();

        assert_eq!(response.status, Status::Success);
        assert_eq!(response.full_text, text);
        assert!(response.content_sample.ends_with("..."));
        assert_eq!(response.metadata.file_name, "guide.txt");
        assert_eq!(response.metadata.file_type, "txt");
        assert!(response.chunks_indexed > 1);
        assert!(dir.path().join("uploads/guide.txt").is_file());

        let doc = pipeline.registry.get(response.document_id).unwrap().unwrap();
        assert_eq!(doc.total_chunks as usize, response.chunks_indexed);
        assert_eq!(pipeline.store.len().unwrap(), response.chunks_indexed);
    }

    #[tokio::test]
    async fn test_unsupported_type_not_indexed() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);

        let err = pipeline.ingest_upload("data.csv", b"a,b\n1,2").await.unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: .csv");
        assert!(!pipeline.store.exists());
        assert_eq!(pipeline.registry.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);

        let err = pipeline.ingest_upload("blank.txt", b"  \n\t ").await.unwrap_err();
        assert!(matches!(err, Error::NoReadableText));
    }

    #[tokio::test]
    async fn test_reupload_replaces_chunks() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);

        let first = pipeline
            .ingest_upload("doc.txt", long_text("ownership").as_bytes())
            .await
            .unwrap();
        let second = pipeline
            .ingest_upload("doc.txt", long_text("borrowing").as_bytes())
            .await
            .unwrap();

        assert_ne!(first.document_id, second.document_id);
        assert_eq!(pipeline.registry.count().unwrap(), 1);
        assert_eq!(pipeline.store.len().unwrap(), second.chunks_indexed);
    }

    #[tokio::test]
    async fn test_identical_reupload_skips_embedding() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let text = long_text("lifetimes");

        let first = pipeline.ingest_upload("same.txt", text.as_bytes()).await.unwrap();
        let second = pipeline.ingest_upload("same.txt", text.as_bytes()).await.unwrap();

        assert_eq!(first.document_id, second.document_id);
        assert_eq!(second.chunks_indexed, 0);
        assert_eq!(pipeline.store.len().unwrap(), first.chunks_indexed);
    }

    #[tokio::test]
    async fn test_name_locks_released_after_upload() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let first = long_text("traits");
        let second = long_text("generics");

        let (a, b) = tokio::join!(
            pipeline.ingest_upload("shared.txt", first.as_bytes()),
            pipeline.ingest_upload("shared.txt", second.as_bytes()),
        );
        a.unwrap();
        b.unwrap();
        pipeline.ingest_upload("broken.csv", b"a,b").await.unwrap_err();

        assert!(pipeline.name_locks.is_empty());
        assert_eq!(pipeline.registry.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_document() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);

        let uploaded = pipeline
            .ingest_upload("gone.txt", long_text("traits").as_bytes())
            .await
            .unwrap();

        let (deleted, removed) = pipeline.delete_document(uploaded.document_id).await.unwrap();
        assert_eq!(deleted.filename, "gone.txt");
        assert_eq!(removed, uploaded.chunks_indexed);
        assert_eq!(pipeline.store.len().unwrap(), 0);
        assert!(!dir.path().join("uploads/gone.txt").exists());

        assert!(matches!(
            pipeline.delete_document(uploaded.document_id).await,
            Err(Error::DocumentNotFound(_))
        ));
    }
}
