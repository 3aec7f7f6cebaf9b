//! Core types for the RAG service

pub mod document;
pub mod response;

pub use document::{extension_of, Chunk, Document, FileType};
pub use response::{
    DocumentListResponse, DocumentSummary, QueryResponse, RetrievedText, SearchResponse, Status,
    TopResult, UploadMetadata, UploadResponse,
};
