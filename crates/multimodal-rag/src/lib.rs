//! multimodal-rag: question answering over uploaded documents
//!
//! Text, PDF and image files are uploaded over HTTP, their text is extracted
//! (OCR for images), chunked, embedded and stored in an on-disk HNSW-backed
//! vector store. Questions are answered by a local Ollama model from the most
//! relevant chunks.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod text;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, Document, FileType},
    response::{QueryResponse, SearchResponse, UploadResponse},
};
