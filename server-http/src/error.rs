use crate::api::responses::ApiResponse;
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::Error;
use tracing::{error, warn};

/// Stable machine-readable code attached to every error response
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

/// Handler error rendered as the failure envelope
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Provider(_) | Error::AllProvidersFailed { .. } => StatusCode::BAD_GATEWAY,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match &self.0 {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Provider(_) => "PROVIDER_ERROR",
            Error::AllProvidersFailed { .. } => "ALL_PROVIDERS_FAILED",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::InvalidInput(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(Error::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            error!("{} {}: {}", status.as_u16(), code, self.0);
        } else {
            warn!("{} {}: {}", status.as_u16(), code, self.0);
        }

        let mut response = (
            status,
            Json(ApiResponse::<()>::failure(self.0.to_string(), code)),
        )
            .into_response();
        // Read back by the error-masking middleware
        response.extensions_mut().insert(ErrorCode(code));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ProviderError;
    use std::time::Duration;

    #[test]
    fn test_status_and_code_mapping() {
        let cases = [
            (Error::InvalidInput("x".into()), 400, "INVALID_INPUT"),
            (Error::NotFound("x".into()), 404, "NOT_FOUND"),
            (
                Error::Provider(ProviderError::Timeout(Duration::from_secs(1))),
                502,
                "PROVIDER_ERROR",
            ),
            (
                Error::AllProvidersFailed {
                    primary: "a".into(),
                    fallback: "b".into(),
                },
                502,
                "ALL_PROVIDERS_FAILED",
            ),
            (Error::Internal("x".into()), 500, "INTERNAL_ERROR"),
        ];

        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status().as_u16(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn test_response_carries_error_code_extension() {
        let response = ApiError(Error::NotFound("portfolio 'x'".into())).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.extensions().get::<ErrorCode>(),
            Some(&ErrorCode("NOT_FOUND"))
        );
    }
}
