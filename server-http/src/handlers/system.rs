use crate::api::ApiResponse;
use crate::api::responses::{ClearResponse, PruneResponse};
use crate::state::AppState;
use argent::domain::CacheStats;
use axum::{Json, extract::State};
use tracing::info;

/// GET /api/system/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Json<ApiResponse<CacheStats>> {
    Json(ApiResponse::ok(state.admin.cache_stats()))
}

/// DELETE /api/system/cache
pub async fn clear_cache(State(state): State<AppState>) -> Json<ApiResponse<ClearResponse>> {
    info!("CLEAR_CACHE");

    state.admin.clear_cache();
    Json(ApiResponse::ok(ClearResponse {
        cleared: true,
        stats: state.admin.cache_stats(),
    }))
}

/// POST /api/system/cache/prune
pub async fn prune_cache(State(state): State<AppState>) -> Json<ApiResponse<PruneResponse>> {
    info!("PRUNE_CACHE");

    let removed = state.admin.prune_cache();
    Json(ApiResponse::ok(PruneResponse {
        removed,
        stats: state.admin.cache_stats(),
    }))
}
