//! End-to-end tests driving the router with the mock market provider.

use argent::ports::SharedProvider;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use market_providers::MockProvider;
use serde_json::{Value, json};
use server_http::{AppState, build_router};
use shared::config::{Config, Environment};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let provider = Arc::new(MockProvider::new(Some(42)));
    build_router(AppState::new(Config::default(), provider, None))
}

fn app_with(config: Config, primary: MockProvider, fallback: Option<MockProvider>) -> Router {
    let fallback = fallback.map(|f| Arc::new(f) as SharedProvider);
    build_router(AppState::new(config, Arc::new(primary), fallback))
}

fn outage() -> MockProvider {
    MockProvider::new(Some(1)).with_failure_rate(1.0)
}

async fn send_raw(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send_raw(router, Method::GET, uri, None).await
}

async fn send_json(router: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    send_raw(router, method, uri, Some(body.to_string())).await
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_health_reports_providers() {
    let app = app();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["primary_provider"], "mock");
    assert_eq!(body["data"]["fallback_provider"], Value::Null);
    assert_eq!(body["data"]["environment"], "development");
}

#[tokio::test]
async fn test_price_is_served_from_cache_on_second_request() {
    let app = app();

    let (status, first) = get(&app, "/api/market/price/btc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["symbol"], "BTC");
    assert_eq!(first["data"]["source"], "mock");

    let (_, second) = get(&app, "/api/market/price/BTC").await;
    assert_eq!(first["data"]["price_usd"], second["data"]["price_usd"]);

    let (_, stats) = get(&app, "/api/system/cache/stats").await;
    assert_eq!(stats["data"]["hits"], 1);
    assert_eq!(stats["data"]["misses"], 1);
    assert_eq!(stats["data"]["size"], 1);
}

#[tokio::test]
async fn test_invalid_symbol_is_bad_request() {
    let app = app();

    let (status, body) = get(&app, "/api/market/price/NOT-A-SYMBOL").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(error_code(&body), "INVALID_INPUT");
}

#[tokio::test]
async fn test_batch_prices() {
    let app = app();

    let (status, body) = get(&app, "/api/market/prices?symbols=btc,%20eth,BTC").await;
    assert_eq!(status, StatusCode::OK);
    let quotes = body["data"].as_array().unwrap();
    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[0]["symbol"], "BTC");
    assert_eq!(quotes[1]["symbol"], "ETH");

    let (status, body) = get(&app, "/api/market/prices").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_INPUT");
}

#[tokio::test]
async fn test_historical_candles_and_validation() {
    let app = app();

    let (status, body) = get(&app, "/api/market/historical/ETH?interval=4h&limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);

    let (status, body) = get(&app, "/api/market/historical/ETH?interval=2h").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_INPUT");

    let (status, body) = get(&app, "/api/market/historical/ETH?limit=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_INPUT");

    let (status, _) = get(&app, "/api/market/historical/ETH?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overview_defaults_to_watchlist() {
    let app = app();

    let (status, body) = get(&app, "/api/market/overview").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["assets"].as_array().unwrap().len(), 10);
    assert_eq!(body["data"]["source"], "mock");

    let (_, body) = get(&app, "/api/market/overview?symbols=SOL,ADA").await;
    let assets = body["data"]["assets"].as_array().unwrap();
    assert_eq!(assets[0]["symbol"], "SOL");
    assert_eq!(assets[1]["symbol"], "ADA");
}

#[tokio::test]
async fn test_portfolio_lifecycle() {
    let app = app();

    let (status, body) =
        send_json(&app, Method::POST, "/api/portfolios", json!({"owner": "alice"})).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/portfolios/{id}/holdings/eth");
    let (status, body) = send_json(
        &app,
        Method::PUT,
        &uri,
        json!({"quantity": 2.0, "cost_basis_usd": 5000.0}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["holdings"][0]["symbol"], "ETH");

    let (status, body) = get(&app, &format!("/api/portfolios/{id}/valuation")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["positions"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["positions"][0]["allocation_pct"], 100.0);

    let (status, body) = send_raw(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["holdings"].as_array().unwrap().is_empty());

    let (status, body) = send_raw(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");

    let (_, body) = get(&app, "/api/portfolios").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_demo_portfolio_valuation() {
    let app = app();

    let (status, body) = get(&app, "/api/portfolios/demo/valuation").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["portfolio_id"], "demo");
    assert_eq!(body["data"]["positions"].as_array().unwrap().len(), 3);
    assert!(body["data"]["total_value_usd"].as_f64().unwrap() > 0.0);

    let (status, body) = get(&app, "/api/portfolios/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn test_strategy_suggestion() {
    let app = app();

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/strategy/suggest",
        json!({"risk_profile": "moderate", "amount_usd": 10000, "horizon_months": 24}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let total: f64 = body["data"]["allocations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["weight_pct"].as_f64().unwrap())
        .sum();
    assert!((total - 100.0).abs() < 0.5);
    assert_eq!(body["data"]["dca_schedule"].as_array().unwrap().len(), 12);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/strategy/suggest",
        json!({"risk_profile": "yolo", "amount_usd": 10000, "horizon_months": 24}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_INPUT");

    let (status, body) = send_raw(
        &app,
        Method::POST,
        "/api/strategy/suggest",
        Some("{not json".into()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_INPUT");
}

#[tokio::test]
async fn test_intent_classification() {
    let app = app();

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/intent/classify",
        json!({"text": "Should I invest in Bitcoin for the long term?"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["intent"], "INVESTMENT");
    assert_eq!(body["data"]["symbols"], json!(["BTC"]));

    let (status, _) =
        send_json(&app, Method::POST, "/api/intent/classify", json!({"text": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cache_prune_and_clear() {
    let app = app();
    get(&app, "/api/market/price/SOL").await;

    let (status, body) = send_raw(&app, Method::POST, "/api/system/cache/prune", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["removed"], 0);
    assert_eq!(body["data"]["stats"]["size"], 1);

    let (status, body) = send_raw(&app, Method::DELETE, "/api/system/cache", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cleared"], true);
    assert_eq!(body["data"]["stats"]["size"], 0);
}

#[tokio::test]
async fn test_provider_failure_without_fallback() {
    let app = app_with(Config::default(), outage(), None);

    let (status, body) = get(&app, "/api/market/price/BTC").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error_code(&body), "PROVIDER_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("simulated outage"));
}

#[tokio::test]
async fn test_fallback_serves_when_primary_is_down() {
    let app = app_with(Config::default(), outage(), Some(MockProvider::new(Some(5))));

    let (status, body) = get(&app, "/api/market/price/ETH").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["symbol"], "ETH");
}

#[tokio::test]
async fn test_all_providers_failed() {
    let app = app_with(Config::default(), outage(), Some(outage()));

    let (status, body) = get(&app, "/api/market/price/ETH").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error_code(&body), "ALL_PROVIDERS_FAILED");

    let (_, stats) = get(&app, "/api/system/cache/stats").await;
    assert_eq!(stats["data"]["size"], 0);
}

#[tokio::test]
async fn test_production_hides_backend_detail() {
    let config = Config {
        environment: Environment::Production,
        ..Config::default()
    };
    let app = app_with(config, outage(), Some(outage()));

    let (status, body) = get(&app, "/api/market/price/ETH").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error_code(&body), "ALL_PROVIDERS_FAILED");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(!message.contains("simulated"));

    // Client errors keep their message
    let (status, body) = get(&app, "/api/portfolios/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"]["message"].as_str().unwrap().contains("missing"));
}
