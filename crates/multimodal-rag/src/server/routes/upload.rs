//! File upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::UploadResponse;

/// POST /upload/file - Save, extract and index one file
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::InvalidRequest("Uploaded file has no file name".to_string()))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read file: {}", e)))?;

        tracing::info!("Processing upload: {} ({} bytes)", filename, data.len());

        let response = state.pipeline().ingest_upload(&filename, &data).await?;
        return Ok(Json(response));
    }

    Err(Error::InvalidRequest(
        "Missing multipart field 'file'".to_string(),
    ))
}
