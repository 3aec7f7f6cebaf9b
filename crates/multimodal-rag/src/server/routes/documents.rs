//! Document management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{DocumentListResponse, DocumentSummary};

/// GET /documents - List all documents
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<DocumentListResponse>> {
    let documents: Vec<DocumentSummary> = state
        .registry()
        .list()?
        .iter()
        .map(DocumentSummary::from)
        .collect();

    let total_count = documents.len();

    Ok(Json(DocumentListResponse {
        documents,
        total_count,
    }))
}

/// GET /documents/:id - Get a specific document
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentSummary>> {
    let doc = state
        .registry()
        .get(id)?
        .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;

    Ok(Json(DocumentSummary::from(&doc)))
}

/// DELETE /documents/:id - Delete a document and its chunks
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let (doc, deleted_chunks) = state.pipeline().delete_document(id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "document_id": id,
        "filename": doc.filename,
        "deleted_chunks": deleted_chunks
    })))
}
