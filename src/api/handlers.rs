//! API Handlers
//!
//! HTTP request handlers for each cache admin endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::cache::{CacheManager, Resource};
use crate::error::{CacheError, Result};
use crate::middleware::Invalidator;
use crate::models::{
    DeleteResponse, HealthResponse, InvalidateRequest, InvalidateResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheManager,
    pub invalidator: Invalidator,
}

impl AppState {
    /// Creates a new AppState around an opened cache manager.
    pub fn new(cache: CacheManager) -> Self {
        Self {
            invalidator: Invalidator::new(cache.clone()),
            cache,
        }
    }
}

/// Handler for GET /health
///
/// Returns 503 when the store does not answer a `PING` in time.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.cache.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse::healthy(state.cache.backend())),
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::unhealthy(err.to_string())),
        ),
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.cache.backend(),
        &state.cache.stats(),
    ))
}

/// Handler for DELETE /cache/keys/*key
///
/// Idempotent: removing an absent key succeeds.
pub async fn delete_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if !state.cache.delete(&key).await {
        return Err(CacheError::StoreUnavailable(format!(
            "could not remove '{}'",
            key
        )));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /cache/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let report = state.invalidator.after_commit(&req.patterns[..]).await;
    info!(patterns = ?req.patterns, removed = report.removed, "Manual cache invalidation");

    Ok(Json(report.into()))
}

/// Handler for POST /cache/invalidate/:resource
///
/// `resource` is the key prefix, e.g. `agendamentos`.
pub async fn invalidate_resource_handler(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    let resource: Resource = resource.parse()?;

    let report = state.invalidator.after_commit_for(resource).await;
    info!(resource = resource.prefix(), removed = report.removed, "Resource cache invalidated");

    Ok(Json(report.into()))
}
