//! File upload endpoints

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{
    response::{DocumentListResponse, MessageResponse},
    FileType,
};

/// POST /api/upload - Upload a PDF or CSV and make it the active source
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>> {
    let mut file: Option<(String, Bytes)> = None;
    let mut file_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Failed to read multipart field: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::validation(format!("Failed to read file: {}", e)))?;
                file = Some((filename, data));
            }
            "file_type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| Error::validation(format!("Failed to read file_type: {}", e)))?;
                file_type = Some(value);
            }
            other => tracing::debug!("Ignoring multipart field: {}", other),
        }
    }

    let file_type = file_type.ok_or_else(|| Error::validation("Missing form field: file_type"))?;
    let file_type = FileType::from_form_value(&file_type)?;
    let (filename, data) = file.ok_or_else(|| Error::validation("Missing form field: file"))?;

    state
        .ingest_service()
        .ingest_upload(file_type, data, filename)
        .await?;

    Ok(Json(MessageResponse {
        message: format!("{} file processed successfully", file_type.display_name()),
    }))
}

/// GET /api/upload/list - Describe the active source, if any
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    Json(DocumentListResponse {
        documents: state.registry().summary().into_iter().collect(),
    })
}
