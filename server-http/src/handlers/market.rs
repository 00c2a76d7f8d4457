use crate::api::ApiResponse;
use crate::api::requests::{HistoricalQuery, SymbolsQuery};
use crate::error::ApiError;
use crate::state::AppState;
use argent::domain::market::{Candle, Interval, MarketOverview, PriceQuote};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use tracing::info;

const DEFAULT_HISTORICAL_LIMIT: usize = 100;

/// GET /api/market/price/{symbol}
pub async fn get_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<PriceQuote>>, ApiError> {
    info!("PRICE: symbol={}", symbol);

    let quote = state.market.price(&symbol).await?;
    Ok(Json(ApiResponse::ok(quote)))
}

/// GET /api/market/prices?symbols=BTC,ETH
pub async fn get_prices(
    State(state): State<AppState>,
    query: Result<Query<SymbolsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<PriceQuote>>>, ApiError> {
    let Query(query) = query?;
    let symbols = query.list();
    info!("PRICES: symbols={:?}", symbols);

    let quotes = state.market.prices(&symbols).await?;
    Ok(Json(ApiResponse::ok(quotes)))
}

/// GET /api/market/historical/{symbol}?interval=1h&limit=100
pub async fn get_historical(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    query: Result<Query<HistoricalQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Candle>>>, ApiError> {
    let Query(query) = query?;
    let interval = match query.interval.as_deref() {
        Some(raw) => raw.parse::<Interval>()?,
        None => Interval::default(),
    };
    let limit = query.limit.unwrap_or(DEFAULT_HISTORICAL_LIMIT);
    info!(
        "HISTORICAL: symbol={}, interval={}, limit={}",
        symbol, interval, limit
    );

    let candles = state.market.historical(&symbol, interval, limit).await?;
    Ok(Json(ApiResponse::ok(candles)))
}

/// GET /api/market/overview?symbols=...
pub async fn get_overview(
    State(state): State<AppState>,
    query: Result<Query<SymbolsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<MarketOverview>>, ApiError> {
    let Query(query) = query?;
    let symbols = query.list();
    info!("OVERVIEW: symbols={:?}", symbols);

    let overview = state.market.overview(&symbols).await?;
    Ok(Json(ApiResponse::ok(overview)))
}
