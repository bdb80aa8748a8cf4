//! Filter cache diagnostics handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::types::{CacheContentsResponse, CacheStatsResponse, ErrorResponse};
use crate::AppState;
use sieve_core::FilterResultCache;

/// Lists every live filter cache entry.
#[utoipa::path(
    get,
    path = "/_cache/contents",
    tag = "cache",
    responses(
        (status = 200, description = "Cached filter results", body = CacheContentsResponse),
        (status = 500, description = "Snapshot could not be rendered", body = ErrorResponse)
    )
)]
pub async fn cache_contents(State(state): State<Arc<AppState>>) -> Response {
    match render_contents(&state.cache) {
        Ok(body) => Json(body).into_response(),
        Err(err) => {
            tracing::error!(code = err.code(), error = %err, "failed to render filter cache contents");
            error_response(&err)
        }
    }
}

/// Renders the whole snapshot before any byte of the response is written.
fn render_contents(cache: &FilterResultCache) -> sieve_core::Result<serde_json::Value> {
    let contents = CacheContentsResponse {
        filter_cache: cache.snapshot().into_iter().map(Into::into).collect(),
    };
    Ok(serde_json::to_value(contents)?)
}

/// Returns filter cache counters.
#[utoipa::path(
    get,
    path = "/_cache/stats",
    tag = "cache",
    responses(
        (status = 200, description = "Cache statistics", body = CacheStatsResponse)
    )
)]
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(CacheStatsResponse::from(state.cache.stats()))
}

fn error_response(err: &sieve_core::Error) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }),
    )
        .into_response()
}
