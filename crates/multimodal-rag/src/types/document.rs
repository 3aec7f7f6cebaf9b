//! Document and chunk types with source tracking

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Plain text file
    Txt,
    /// PDF document
    Pdf,
    /// Image (for OCR) - requires tesseract
    Image,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension (with or without the leading dot)
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "txt" => Self::Txt,
            "pdf" => Self::Pdf,
            "png" | "jpg" | "jpeg" => Self::Image,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a file name or path
    pub fn from_filename(filename: &str) -> Self {
        Self::from_extension(&extension_of(filename))
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Txt => "Text File",
            Self::Pdf => "PDF",
            Self::Image => "Image",
            Self::Unknown => "Unknown",
        }
    }
}

/// Lowercased extension including the dot (`".pdf"`), or empty
pub fn extension_of(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// A document that has been uploaded and indexed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// File name as uploaded
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// SHA-256 of the extracted text, used to skip re-indexing
    pub content_hash: String,
    /// File size in bytes
    pub file_size: u64,
    /// Total number of chunks created
    pub total_chunks: u32,
    /// Where the upload was saved
    pub source_path: String,
    /// Upload timestamp
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document record
    pub fn new(
        filename: String,
        file_type: FileType,
        content_hash: String,
        file_size: u64,
        source_path: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            file_type,
            content_hash,
            file_size,
            total_chunks: 0,
            source_path,
            uploaded_at: chrono::Utc::now(),
        }
    }
}

/// A chunk of text from a document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Text content
    pub content: String,
    /// Source file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Chunk index within document
    pub chunk_index: u32,
    /// Character position in the extracted text
    pub char_start: usize,
    pub char_end: usize,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        document_id: Uuid,
        content: String,
        source: Option<String>,
        char_start: usize,
        char_end: usize,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            source,
            chunk_index,
            char_start,
            char_end,
        }
    }

    /// Source name for display, `"Unknown"` when the chunk has none
    pub fn source_or_unknown(&self) -> &str {
        self.source.as_deref().unwrap_or("Unknown")
    }
}
