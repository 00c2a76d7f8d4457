use crate::api::ApiResponse;
use crate::api::requests::{ClassifyIntentRequest, SuggestStrategyRequest};
use crate::error::ApiError;
use crate::state::AppState;
use argent::domain::intent::IntentClassification;
use argent::domain::strategy::StrategySuggestion;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use shared::Error;
use tracing::info;

const MAX_QUESTION_CHARS: usize = 2_000;

/// POST /api/strategy/suggest
pub async fn suggest_strategy(
    State(state): State<AppState>,
    payload: Result<Json<SuggestStrategyRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<StrategySuggestion>>, ApiError> {
    let Json(req) = payload?;
    info!(
        "SUGGEST: risk_profile={}, amount_usd={}, horizon_months={}",
        req.risk_profile, req.amount_usd, req.horizon_months
    );

    let suggestion = state.advisor.suggest(req.into_domain()?).await?;
    Ok(Json(ApiResponse::ok(suggestion)))
}

/// POST /api/intent/classify
pub async fn classify_intent(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyIntentRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<IntentClassification>>, ApiError> {
    let Json(req) = payload?;
    let text = req.text.trim();
    if text.is_empty() {
        return Err(Error::InvalidInput("text cannot be empty".into()).into());
    }
    if text.chars().count() > MAX_QUESTION_CHARS {
        return Err(Error::InvalidInput(format!(
            "text must be at most {MAX_QUESTION_CHARS} characters"
        ))
        .into());
    }

    let classification = state.classifier.classify(text);
    info!(
        "CLASSIFY: intent={:?}, confidence={}",
        classification.intent, classification.confidence
    );
    Ok(Json(ApiResponse::ok(classification)))
}
