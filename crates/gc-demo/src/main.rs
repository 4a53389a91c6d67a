//! GC Demo - memory-pressure demonstration service
//!
//! Drives the allocator with pure garbage, mixed generational and naturally
//! aging survivor workloads, keeping long-lived chunks in bounded stores.

mod config;
mod error;
mod server;
mod types;
mod workload;

use crate::config::Config;
use crate::error::{GcDemoError, Result};
use crate::server::{start_server, ServerState, SharedState};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("gc_demo=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting GC demo service...");

    let config = Config::from_env()?;
    info!("Port: {}", config.port);
    info!("Chunk size: {} MB", config.chunk_size_mb);
    info!(
        "Max cache size: {} MB ({})",
        config.max_cache_mb, config.oversize_policy
    );
    info!("Max survivors: {}", config.max_survivors);
    info!("Max request: {} MB", config.max_request_mb);

    let port = config.port;
    let state: SharedState = Arc::new(ServerState::new(config));

    // Start HTTP server (blocking until Ctrl-C)
    start_server(state.clone(), port, shutdown_signal())
        .await
        .map_err(|e| GcDemoError::Config(format!("Server error: {}", e)))?;

    // Release held chunks before exiting
    state.cache.clear();
    state.survivors.clear();
    info!(
        cache = ?state.cache.stats(),
        survivors = ?state.survivors.stats(),
        "GC demo service stopped"
    );

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
