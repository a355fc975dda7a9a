//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::Uri,
    Json,
};
use tracing::info;

use crate::cache::ByteView;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::loading::LoadingCache;
use crate::models::{
    GetAllResponse, GetResponse, HealthResponse, SaveResponse, SetRequest, SetResponse,
    StatsResponse, TtlResponse,
};
use crate::origin::MapRetriever;
use crate::snapshot;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The loading cache served by this node
    pub cache: Arc<LoadingCache>,
    /// Snapshot file used by POST /save, if persistence is enabled
    pub snapshot_path: Option<Arc<PathBuf>>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Arc<LoadingCache>, snapshot_path: Option<PathBuf>) -> Self {
        Self {
            cache,
            snapshot_path: snapshot_path.map(Arc::new),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// The cache is backed by a [`MapRetriever`] seeded from
    /// `config.origin_seed`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = LoadingCache::builder()
            .strategy(config.strategy)
            .capacity(config.capacity)
            .ttl_strategy(config.populate_ttl)
            .retriever(MapRetriever::from_seed(&config.origin_seed))
            .build()?;
        Ok(Self::new(Arc::new(cache), config.snapshot_path.clone()))
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair. `ttl` defaults to `-1` (no expiry).
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state
        .cache
        .set(&req.key, ByteView::from(req.value), req.ttl)?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Returns the cached value, loading it from the origin on a miss.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state.cache.get(&key).await?;
    Ok(Json(GetResponse::new(key, value.to_string())))
}

/// Handler for GET /getall
pub async fn get_all_handler(State(state): State<AppState>) -> Json<GetAllResponse> {
    Json(GetAllResponse::from_entries(&state.cache.get_all()))
}

/// Handler for GET /ttl/:key
pub async fn ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TtlResponse>> {
    let ttl = state.cache.ttl(&key)?;
    Ok(Json(TtlResponse::new(key, ttl)))
}

/// Handler for POST /save
///
/// Writes a snapshot immediately. Fails if persistence is disabled.
pub async fn save_handler(State(state): State<AppState>) -> Result<Json<SaveResponse>> {
    let path = state
        .snapshot_path
        .clone()
        .ok_or_else(|| CacheError::Config("snapshot path is not configured".to_string()))?;

    let entries = state.cache.get_all();
    let saved = tokio::task::spawn_blocking(move || snapshot::save(&path, &entries))
        .await
        .map_err(|err| CacheError::Internal(err.to_string()))??;

    info!("Snapshot saved on request ({} entries)", saved);
    Ok(Json(SaveResponse { saved }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let strategy = state.cache.store().strategy();
    Json(StatsResponse::new(strategy, &state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Fallback for unknown routes.
pub async fn not_found_handler(uri: Uri) -> CacheError {
    CacheError::NotFound(uri.path().to_string())
}
