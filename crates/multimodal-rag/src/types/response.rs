//! Response envelopes for uploads, queries and searches

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{Document, FileType};

/// Envelope status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Metadata echoed back for an upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMetadata {
    /// File name as uploaded
    pub file_name: String,
    /// Text after the last '.' of the file name
    pub file_type: String,
    /// RFC 3339 timestamp
    pub upload_time: String,
    /// Where the file was saved
    pub source_path: String,
}

impl UploadMetadata {
    /// Build metadata for a file saved at `source_path`
    pub fn new(file_name: &str, source_path: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            file_type: file_name.rsplit('.').next().unwrap_or_default().to_string(),
            upload_time: chrono::Utc::now().to_rfc3339(),
            source_path: source_path.to_string(),
        }
    }
}

/// Response from `POST /upload/file`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: Status,
    /// Full extracted text
    pub full_text: String,
    /// First characters of the text, for preview
    pub content_sample: String,
    pub metadata: UploadMetadata,
    /// Registry ID of the indexed document
    pub document_id: Uuid,
    /// Chunks written to the vector store (0 when the content was unchanged)
    pub chunks_indexed: usize,
}

/// One retrieved chunk in a query response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopResult {
    /// Source file name, `"Unknown"` when missing
    pub source: String,
    /// Similarity score (higher is more relevant)
    pub relevance: f32,
    /// Cleaned leading snippet of the chunk
    pub snippet: String,
}

/// Response from `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResponse {
    /// Answer was produced
    Answered {
        status: Status,
        query: String,
        generated_answer: String,
        top_results: Vec<TopResult>,
    },
    /// Nothing to answer from
    Unanswered { status: Status, answer: String },
}

impl QueryResponse {
    /// Successful answer
    pub fn answered(query: String, generated_answer: String, top_results: Vec<TopResult>) -> Self {
        Self::Answered {
            status: Status::Success,
            query,
            generated_answer,
            top_results,
        }
    }

    /// No index exists yet
    pub fn no_vector_store() -> Self {
        Self::Unanswered {
            status: Status::Error,
            answer: "No vector store found. Please upload a file first.".to_string(),
        }
    }

    /// Index exists but returned nothing
    pub fn no_relevant_content() -> Self {
        Self::Unanswered {
            status: Status::Error,
            answer: "No relevant content found.".to_string(),
        }
    }

    /// Whether an answer was produced
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Answered { .. })
    }
}

/// One hit from `POST /search`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedText {
    /// Leading part of the chunk content
    pub content: String,
    /// Similarity rounded to three decimals
    pub relevance_score: f32,
    /// Source file name
    pub source: String,
}

/// Response from `POST /search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: Status,
    pub query: String,
    pub results: Vec<RetrievedText>,
}

/// Summary of an indexed document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document ID
    pub id: Uuid,
    /// Filename
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Number of chunks created
    pub total_chunks: u32,
    /// File size in bytes
    pub file_size: u64,
    /// Saved upload path
    pub source_path: String,
    /// Upload timestamp
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            file_type: doc.file_type,
            total_chunks: doc.total_chunks,
            file_size: doc.file_size,
            source_path: doc.source_path.clone(),
            uploaded_at: doc.uploaded_at,
        }
    }
}

/// Response listing documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    /// Documents, newest first
    pub documents: Vec<DocumentSummary>,
    /// Total count
    pub total_count: usize,
}
