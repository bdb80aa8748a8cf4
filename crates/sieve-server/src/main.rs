#![allow(clippy::doc_markdown)]
//! Sieve Server - diagnostics HTTP API for the Sieve filter cache.
//!
//! Standalone harness: it serves an empty cache built from the loaded
//! configuration, which is useful to check configuration, logging and the
//! OpenAPI document. A host that evaluates filters embeds the API instead by
//! passing its own cache to [`sieve_server::app`].

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sieve_core::{FilterResultCache, LoggingConfig, SieveConfig};
use sieve_server::{app, AppState};

/// Sieve Server - inspect an adaptive filter-result cache
#[derive(Parser, Debug)]
#[command(name = "sieve-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "sieve.toml", env = "SIEVE_CONFIG")]
    config: PathBuf,

    /// Host address to bind to (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=debug", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = SieveConfig::load_from_path(&args.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    init_tracing(&config.logging);
    tracing::info!("Starting Sieve diagnostics server...");
    tracing::info!(
        enabled = config.cache.enabled,
        compact_sparse = config.cache.compact_sparse,
        "filter cache configured"
    );

    // Nothing in this process evaluates filters, so the cache stays empty.
    let state = Arc::new(AppState {
        cache: FilterResultCache::new(config.cache.clone()),
    });

    let mut router = app(state);
    if config.server.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }
    let router = router.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Sieve server listening on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
