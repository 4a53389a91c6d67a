//! HTTP server for the workload endpoints
//!
//! Provides /health, the allocate-and-discard endpoints under /api/memory,
//! the age-evicting cache under /api/enhanced and the survivor rotation
//! under /api/better.

use crate::config::Config;
use crate::error::GcDemoError;
use crate::types::{
    round2, CacheStatsResponse, ClearResponse, HealthResponse, InfoResponse, LoadResponse,
    MixedResponse, NaturalResponse, SurvivorStatsResponse, SustainedQuery, SustainedResponse,
};
use crate::workload::Allocator;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use blob_store::{AgeEvictingCache, RotationList};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub config: Config,
    pub allocator: Allocator,
    /// Long-lived objects with oldest-first eviction
    pub cache: AgeEvictingCache,
    /// Recent survivor chunks
    pub survivors: RotationList,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(config: Config) -> Self {
        let allocator = Allocator::new(config.chunk_size_mb);
        let cache = AgeEvictingCache::new(config.max_cache_bytes(), config.oversize_policy);
        let survivors = RotationList::new(config.max_survivors, config.chunk_bytes() as u64);

        Self {
            config,
            allocator,
            cache,
            survivors,
            started_at: Utc::now(),
        }
    }

    fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    fn cache_stats(&self) -> CacheStatsResponse {
        CacheStatsResponse::new(&self.cache.stats(), self.cache.policy())
    }

    fn survivor_stats(&self) -> SurvivorStatsResponse {
        SurvivorStatsResponse::from(&self.survivors.stats())
    }

    /// Refuse a request that would allocate more than `MAX_REQUEST_MB`
    fn check_request_mb(&self, requested_mb: u64) -> Result<(), Response> {
        let max_mb = self.config.max_request_mb;
        if requested_mb <= max_mb {
            return Ok(());
        }
        warn!(requested_mb, max_mb, "Rejecting oversized allocation request");
        Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!(
                    "Request of {} MB exceeds MAX_REQUEST_MB ({})",
                    requested_mb, max_mb
                ),
            }),
        )
            .into_response())
    }
}

/// Megabytes requested by a pair of size parameters; negatives count as zero
fn requested_mb(first_mb: i64, second_mb: i64) -> u64 {
    (first_mb.max(0) as u64).saturating_add(second_mb.max(0) as u64)
}

pub type SharedState = Arc<ServerState>;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn internal_error(err: GcDemoError) -> Response {
    error!(error = %err, "Workload failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/memory/info", get(info))
        .route("/api/memory/load/{count}", post(load))
        .route("/api/memory/sustained", post(sustained))
        .route(
            "/api/enhanced/mixed/{short_lived_mb}/{long_lived_mb}",
            post(mixed),
        )
        .route("/api/enhanced/cache-stats", get(cache_stats))
        .route("/api/enhanced/clear-cache", post(clear_cache))
        .route(
            "/api/better/natural/{short_lived_mb}/{survivors_mb}",
            post(natural),
        )
        .route("/api/better/stats", get(survivor_stats))
        .route("/api/better/clear", post(clear_survivors))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server, returning once `shutdown` resolves
pub async fn start_server(
    state: SharedState,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_secs(),
        cache: state.cache.stats(),
        survivors: state.survivors.stats(),
    })
}

async fn info(State(state): State<SharedState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        application: state.config.app_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
        chunk_size_mb: state.config.chunk_size_mb,
        max_cache_mb: state.config.max_cache_mb,
        max_survivors: state.config.max_survivors,
        oversize_policy: state.config.oversize_policy,
        max_request_mb: state.config.max_request_mb,
    })
}

/// Burst allocation of `count` chunks that become garbage immediately
async fn load(State(state): State<SharedState>, Path(count): Path<i64>) -> Response {
    let total_mb = (count.max(0) as u64).saturating_mul(state.config.chunk_size_mb);
    if let Err(response) = state.check_request_mb(total_mb) {
        return response;
    }
    let task = tokio::task::spawn_blocking(move || state.allocator.allocate_and_discard(count));
    match task.await {
        Ok(result) => Json(LoadResponse::from(&result)).into_response(),
        Err(e) => internal_error(e.into()),
    }
}

/// Allocate continuously for `duration` seconds at `rate` chunks per second
async fn sustained(
    State(state): State<SharedState>,
    Query(params): Query<SustainedQuery>,
) -> Response {
    let result = state
        .allocator
        .sustained_load(params.duration, params.rate, state.config.max_sustained_secs)
        .await;

    match result {
        Ok(result) => Json(SustainedResponse {
            status: "completed",
            duration_seconds: params.duration,
            objects_allocated: result.object_count,
            total_mb: round2(result.total_mb()),
            actual_duration_ms: round2(result.duration_ms()),
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// Mixed workload: short-lived garbage plus long-lived cached chunks
async fn mixed(
    State(state): State<SharedState>,
    Path((short_lived_mb, long_lived_mb)): Path<(i64, i64)>,
) -> Response {
    if let Err(response) = state.check_request_mb(requested_mb(short_lived_mb, long_lived_mb)) {
        return response;
    }
    let task = tokio::task::spawn_blocking(move || {
        state
            .allocator
            .mixed_workload(&state.cache, short_lived_mb, long_lived_mb)
    });
    match task.await {
        Ok(result) => Json(MixedResponse::from(&result)).into_response(),
        Err(e) => internal_error(e.into()),
    }
}

async fn cache_stats(State(state): State<SharedState>) -> Json<CacheStatsResponse> {
    Json(state.cache_stats())
}

async fn clear_cache(
    State(state): State<SharedState>,
) -> Json<ClearResponse<CacheStatsResponse>> {
    state.cache.clear();
    Json(ClearResponse {
        status: "cache cleared",
        current_stats: state.cache_stats(),
    })
}

/// Natural generational workload: short-lived garbage plus rotating survivors
async fn natural(
    State(state): State<SharedState>,
    Path((short_lived_mb, survivors_mb)): Path<(i64, i64)>,
) -> Response {
    if let Err(response) = state.check_request_mb(requested_mb(short_lived_mb, survivors_mb)) {
        return response;
    }
    let task = tokio::task::spawn_blocking(move || {
        state
            .allocator
            .natural_generational_workload(&state.survivors, short_lived_mb, survivors_mb)
    });
    match task.await {
        Ok(result) => Json(NaturalResponse::from(&result)).into_response(),
        Err(e) => internal_error(e.into()),
    }
}

async fn survivor_stats(State(state): State<SharedState>) -> Json<SurvivorStatsResponse> {
    Json(state.survivor_stats())
}

async fn clear_survivors(
    State(state): State<SharedState>,
) -> Json<ClearResponse<SurvivorStatsResponse>> {
    state.survivors.clear();
    Json(ClearResponse {
        status: "cleared",
        current_stats: state.survivor_stats(),
    })
}
