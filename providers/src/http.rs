use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::ProviderError;
use std::time::Duration;
use tracing::debug;

/// Send `request` and decode a JSON body, mapping transport and status
/// failures onto `ProviderError`
pub(crate) async fn get_json<T>(
    request: RequestBuilder,
    provider: &str,
    timeout: Duration,
) -> Result<T, ProviderError>
where
    T: DeserializeOwned,
{
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(e, timeout))?;

    let status = response.status();
    let url = response.url().path().to_string();
    debug!("{} {} -> {}", provider, url, status);

    if status == StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound(url));
    }
    if !status.is_success() {
        return Err(ProviderError::Http {
            provider: provider.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| transport_error(e, timeout))?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::Network(err.to_string())
    }
}

/// Parse a decimal that some exchanges send as a JSON string
pub(crate) fn parse_decimal(raw: &str, field: &str) -> Result<f64, ProviderError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProviderError::Malformed(format!("{field}: '{raw}' is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("42.5", "price").unwrap(), 42.5);
        assert!(matches!(
            parse_decimal("abc", "price"),
            Err(ProviderError::Malformed(msg)) if msg.contains("price")
        ));
        assert!(parse_decimal("NaN", "price").is_err());
    }
}
