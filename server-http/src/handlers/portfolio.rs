use crate::api::ApiResponse;
use crate::api::requests::{CreatePortfolioRequest, UpsertHoldingRequest};
use crate::error::ApiError;
use crate::state::AppState;
use argent::domain::portfolio::{Holding, Portfolio, PortfolioValuation};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::info;

/// GET /api/portfolios
pub async fn list_portfolios(State(state): State<AppState>) -> Json<ApiResponse<Vec<Portfolio>>> {
    Json(ApiResponse::ok(state.portfolios.list().await))
}

/// POST /api/portfolios
pub async fn create_portfolio(
    State(state): State<AppState>,
    payload: Result<Json<CreatePortfolioRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Portfolio>>), ApiError> {
    let Json(req) = payload?;
    info!("CREATE_PORTFOLIO: owner={}", req.owner);

    let portfolio = state.portfolios.create(&req.owner).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(portfolio))))
}

/// GET /api/portfolios/{id}
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Portfolio>>, ApiError> {
    let portfolio = state.portfolios.get(&id).await?;
    Ok(Json(ApiResponse::ok(portfolio)))
}

/// GET /api/portfolios/{id}/valuation
pub async fn get_valuation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PortfolioValuation>>, ApiError> {
    info!("VALUATION: portfolio={}", id);

    let valuation = state.portfolios.valuation(&id).await?;
    Ok(Json(ApiResponse::ok(valuation)))
}

/// PUT /api/portfolios/{id}/holdings/{symbol}
pub async fn upsert_holding(
    State(state): State<AppState>,
    Path((id, symbol)): Path<(String, String)>,
    payload: Result<Json<UpsertHoldingRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Portfolio>>, ApiError> {
    let Json(req) = payload?;
    info!(
        "UPSERT_HOLDING: portfolio={}, symbol={}, quantity={}",
        id, symbol, req.quantity
    );

    let holding = Holding {
        symbol,
        quantity: req.quantity,
        cost_basis_usd: req.cost_basis_usd,
    };
    let portfolio = state.portfolios.upsert_holding(&id, holding).await?;
    Ok(Json(ApiResponse::ok(portfolio)))
}

/// DELETE /api/portfolios/{id}/holdings/{symbol}
pub async fn remove_holding(
    State(state): State<AppState>,
    Path((id, symbol)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Portfolio>>, ApiError> {
    info!("REMOVE_HOLDING: portfolio={}, symbol={}", id, symbol);

    let portfolio = state.portfolios.remove_holding(&id, &symbol).await?;
    Ok(Json(ApiResponse::ok(portfolio)))
}
