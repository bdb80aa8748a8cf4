//! Health check handler.

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::types::HealthResponse;
use crate::AppState;

/// Health check endpoint, with a summary of the cache it serves.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.cache.stats();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_enabled: state.cache.config().enabled,
        entries: stats.entries,
        tracked_segments: stats.tracked_segments,
    })
}
