use crate::handlers;
use crate::middleware::mask_server_errors;
use crate::state::AppState;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);
    let expose_error_details = state.config.expose_error_details();

    let router = Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Market data
        .route("/api/market/price/{symbol}", get(handlers::get_price))
        .route("/api/market/prices", get(handlers::get_prices))
        .route(
            "/api/market/historical/{symbol}",
            get(handlers::get_historical),
        )
        .route("/api/market/overview", get(handlers::get_overview))
        // Portfolios
        .route(
            "/api/portfolios",
            get(handlers::list_portfolios).post(handlers::create_portfolio),
        )
        .route("/api/portfolios/{id}", get(handlers::get_portfolio))
        .route("/api/portfolios/{id}/valuation", get(handlers::get_valuation))
        .route(
            "/api/portfolios/{id}/holdings/{symbol}",
            put(handlers::upsert_holding).delete(handlers::remove_holding),
        )
        // Advisor
        .route("/api/strategy/suggest", post(handlers::suggest_strategy))
        .route("/api/intent/classify", post(handlers::classify_intent))
        // System routes
        .route("/api/system/cache/stats", get(handlers::cache_stats))
        .route("/api/system/cache", delete(handlers::clear_cache))
        .route("/api/system/cache/prune", post(handlers::prune_cache));

    let router = if expose_error_details {
        router
    } else {
        router.layer(middleware::from_fn(mask_server_errors))
    };

    router
        // Middleware
        .layer(cors)
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
