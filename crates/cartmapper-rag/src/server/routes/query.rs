//! Question answering endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryOutcome, QueryRequest};

use super::JsonBody;

/// POST /api/query - Answer a question against the active source
pub async fn query(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<QueryRequest>,
) -> Result<Json<QueryOutcome>> {
    tracing::info!("Query ({}): \"{}\"", request.language, request.query);

    let outcome = state.query_service().answer(request).await?;
    Ok(Json(outcome))
}
