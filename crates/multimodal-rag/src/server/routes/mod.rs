//! API routes for the RAG server

pub mod documents;
pub mod query;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        // Upload - with larger body limit for files
        .route(
            "/upload/file",
            post(upload::upload_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Question answering and plain search
        .route("/query", post(query::query))
        .route("/search", post(query::search))
        // Document management
        .route("/documents", get(documents::list_documents))
        .route(
            "/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        // Info
        .route("/info", get(info))
}

/// Liveness message
async fn root() -> Json<Value> {
    Json(json!({ "message": "Multimodal RAG API is running successfully!" }))
}

/// API info endpoint
async fn info() -> Json<Value> {
    Json(json!({
        "name": "multimodal-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering over uploaded text, PDF and image documents",
        "endpoints": {
            "GET /": "Liveness message",
            "POST /upload/file": "Upload a .txt, .pdf, .png, .jpg or .jpeg file (multipart field 'file')",
            "POST /query": "Answer a question (form field 'query')",
            "POST /search": "Ranked chunks without generation (form fields 'query', 'top_k')",
            "GET /documents": "List all documents",
            "GET /documents/:id": "Get document details",
            "DELETE /documents/:id": "Delete a document and its chunks",
            "GET /health": "Health check",
            "GET /ready": "Readiness check"
        }
    }))
}
