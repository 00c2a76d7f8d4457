use crate::api::ApiResponse;
use crate::api::responses::HealthResponse;
use crate::state::AppState;
use axum::{Json, extract::State};
use chrono::Utc;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let (primary, fallback) = state.market.provider_names();
    let now = Utc::now();

    Json(ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.as_str(),
        primary_provider: primary,
        fallback_provider: fallback,
        uptime_secs: (now - state.started_at).num_seconds(),
        timestamp: now,
    }))
}
