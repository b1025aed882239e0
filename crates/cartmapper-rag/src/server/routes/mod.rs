//! API routes for the CartMapper server

pub mod qr;
pub mod query;
pub mod upload;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, DefaultBodyLimit, FromRequest, Request},
    routing::{get, post},
    Json, Router,
};

use crate::error::Error;
use crate::server::state::AppState;
use crate::types::response::HealthResponse;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Ingestion
        .route(
            "/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/upload/list", get(upload::list_documents))
        .route(
            "/process-qr",
            post(qr::process_qr).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/process-pdf-url", post(qr::process_pdf_url))
        // Query
        .route("/query", post(query::query))
        .route("/health", get(health))
}

/// GET /api/health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// JSON body extractor whose rejections use the `{"detail": ...}` error shape
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Error::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}
