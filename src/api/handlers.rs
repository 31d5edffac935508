//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tokio::task;

use crate::backend::SimulatedBackend;
use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    HealthResponse, ItemsQuery, ItemsResponse, SetItemsRequest, StatsResponse, WriteResponse,
};

/// Application state shared across all handlers.
///
/// The cache synchronizes internally, so handlers share it through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Read-through cache of backend items, coalesced per group id
    pub cache: Arc<CacheStore<String, String>>,
    /// Source of cache misses
    pub backend: Arc<SimulatedBackend>,
}

impl AppState {
    /// Creates a new AppState with the given cache store and backend.
    pub fn new(cache: CacheStore<String, String>, backend: SimulatedBackend) -> Self {
        Self {
            cache: Arc::new(cache),
            backend: Arc::new(backend),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let cache = CacheStore::new(config.max_entries, config.cache_ttl());
        Self::new(cache, SimulatedBackend::new(config.backend_latency()))
    }
}

/// Handler for GET /items?ids=1,2,3&group=g
///
/// Resolves the ids through the cache. The lookup and any backend fetch
/// block, so they run on tokio's blocking pool.
pub async fn get_items_handler(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> Result<(StatusCode, Json<ItemsResponse>)> {
    let ids = query.parse_ids().map_err(CacheError::InvalidRequest)?;
    let group = query.group();

    let cache = Arc::clone(&state.cache);
    let backend = Arc::clone(&state.backend);
    let outcome = task::spawn_blocking(move || {
        cache.get(&ids, |missing| backend.fetch(missing), group)
    })
    .await
    .map_err(|e| CacheError::Internal(e.to_string()))?;

    match outcome {
        Ok(items) => Ok((StatusCode::OK, Json(ItemsResponse::new(items)))),
        Err(err) => {
            let message = err.to_string();
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(ItemsResponse::partial(err.hits, message)),
            ))
        }
    }
}

/// Handler for PUT /items
///
/// Stores the given values, replacing existing ones.
pub async fn set_items_handler(
    State(state): State<AppState>,
    Json(req): Json<SetItemsRequest>,
) -> Result<Json<WriteResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let count = req.items.len();
    state.cache.set(req.items);

    Ok(Json(WriteResponse::stored(count)))
}

/// Handler for DELETE /items?ids=1,2
///
/// Removes the given ids; unknown ids are ignored.
pub async fn delete_items_handler(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<WriteResponse>> {
    let ids = query.parse_ids().map_err(CacheError::InvalidRequest)?;

    let removed = state.cache.remove(&ids);

    Ok(Json(WriteResponse::removed(removed)))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the service.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
