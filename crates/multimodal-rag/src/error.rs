//! Error types for the RAG service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extension outside the txt/pdf/image set
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Extraction succeeded but produced only whitespace
    #[error("No readable text found in file")]
    NoReadableText,

    /// OCR error
    #[error("OCR failed: {0}")]
    Ocr(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector database error
    #[error("Vector database error: {0}")]
    VectorDb(String),

    /// Ollama/LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector db error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short machine-readable kind, used in the response envelope
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::UnsupportedFileType(_) => "unsupported_type",
            Error::FileParse { .. } => "parse_error",
            Error::NoReadableText => "no_text",
            Error::Ocr(_) => "ocr_error",
            Error::Embedding(_) => "embedding_error",
            Error::VectorDb(_) => "vector_db_error",
            Error::Llm(_) => "llm_error",
            Error::DocumentNotFound(_) => "not_found",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Http(_) => "http_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::UnsupportedFileType(_) | Error::InvalidRequest(_) | Error::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::FileParse { .. } | Error::NoReadableText | Error::Ocr(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            Error::Llm(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Embedding(_) | Error::VectorDb(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
            "error_type": self.kind(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_messages() {
        assert_eq!(
            Error::UnsupportedFileType(".docx".to_string()).to_string(),
            "Unsupported file type: .docx"
        );
        assert_eq!(Error::NoReadableText.to_string(), "No readable text found in file");
        assert_eq!(
            Error::Ocr("tesseract not found".to_string()).to_string(),
            "OCR failed: tesseract not found"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::UnsupportedFileType(".bin".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::NoReadableText.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            Error::DocumentNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::llm("down").status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
