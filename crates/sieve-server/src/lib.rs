#![allow(clippy::doc_markdown)]
#![allow(clippy::unused_async)]
#![allow(clippy::needless_for_each)]
//! Sieve Server - diagnostics HTTP API for the Sieve filter cache.
//!
//! A host process that owns a [`FilterResultCache`] hands a clone of it to
//! [`app`] and serves the resulting router next to its own endpoints.
//!
//! ## OpenAPI Documentation
//!
//! - Swagger UI: `GET /swagger-ui`
//! - OpenAPI JSON: `GET /api-docs/openapi.json`

mod handlers;
mod types;

use axum::{routing::get, Router};
use sieve_core::FilterResultCache;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use types::*;

pub use handlers::{cache_contents, cache_stats, health_check};

// ============================================================================
// OpenAPI Documentation
// ============================================================================

/// Sieve API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sieve Diagnostics API",
        version = "0.3.0",
        description = "Read-only view of the adaptive filter-result cache."
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "cache", description = "Filter cache diagnostics")
    ),
    paths(
        handlers::health::health_check,
        handlers::cache::cache_contents,
        handlers::cache::cache_stats
    ),
    components(
        schemas(
            HealthResponse,
            CacheEntryResponse,
            CacheContentsResponse,
            CacheStatsResponse,
            ErrorResponse
        )
    )
)]
pub struct ApiDoc;

// ============================================================================
// Application State
// ============================================================================

/// Application state shared across handlers.
pub struct AppState {
    /// The filter cache being inspected.
    pub cache: FilterResultCache,
}

/// Builds the diagnostics router, including Swagger UI.
pub fn app(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/health", get(health_check))
        .route("/_cache/contents", get(cache_contents))
        .route("/_cache/stats", get(cache_stats))
        .with_state(state);

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    api_router.merge(Router::<()>::new().merge(swagger_ui))
}

// ============================================================================
// Tests
// ============================================================================
