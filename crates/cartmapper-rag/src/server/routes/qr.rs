//! QR code and PDF link ingestion endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{
    response::{PdfUrlResponse, QrResponse},
    PdfUrlRequest, QrRequest,
};

use super::JsonBody;

/// POST /api/process-qr - Decode a QR code and ingest the PDF it links to
pub async fn process_qr(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<QrRequest>,
) -> Result<Json<QrResponse>> {
    let qr_data = state.ingest_service().ingest_qr(request).await?;

    Ok(Json(QrResponse {
        message: "QR processed successfully".to_string(),
        qr_data,
    }))
}

/// POST /api/process-pdf-url - Download and ingest a linked PDF
pub async fn process_pdf_url(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PdfUrlRequest>,
) -> Result<Json<PdfUrlResponse>> {
    state.ingest_service().ingest_pdf_url(&request.pdf_url).await?;

    Ok(Json(PdfUrlResponse {
        message: "PDF processed successfully".to_string(),
        pdf_url: request.pdf_url,
    }))
}
