//! HTTP handler for advisory queries

use axum::{extract::State, Json};
use shared::{AdvisoryRequest, AdvisoryResponse};

use crate::error::AppResult;
use crate::AppState;

/// Route a farmer's question through the advisory pipeline
pub async fn submit_query(
    State(state): State<AppState>,
    Json(request): Json<AdvisoryRequest>,
) -> AppResult<Json<AdvisoryResponse>> {
    let response = state.advisory.handle(request).await?;
    Ok(Json(response))
}
