use crate::api::ApiResponse;
use crate::error::ErrorCode;
use axum::{
    Json,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

const GENERIC_MESSAGE: &str = "The request could not be completed. Please try again later.";

/// Replace the body of 5xx envelopes with a generic message.
///
/// Installed only when the configuration forbids exposing backend detail;
/// the status and error code are preserved.
pub async fn mask_server_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if !response.status().is_server_error() {
        return response;
    }

    let status = response.status();
    let code = response
        .extensions()
        .get::<ErrorCode>()
        .map(|c| c.0)
        .unwrap_or("INTERNAL_ERROR");

    (
        status,
        Json(ApiResponse::<()>::failure(GENERIC_MESSAGE, code)),
    )
        .into_response()
}
