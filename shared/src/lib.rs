// shared/src/lib.rs
use std::time::Duration;

/// Failure of a single market-data backend call
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    #[error("{provider} returned HTTP {status}")]
    Http { provider: String, status: u16 },
    #[error("network: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported symbol: {0}")]
    UnsupportedSymbol(String),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("provider failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("all providers failed: primary: {primary}; fallback: {fallback}")]
    AllProvidersFailed { primary: String, fallback: String },
    #[error("internal: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_providers_failed_mentions_both_messages() {
        let err = Error::AllProvidersFailed {
            primary: ProviderError::Timeout(Duration::from_millis(50)).to_string(),
            fallback: ProviderError::Network("connection refused".into()).to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("timeout"));
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn test_provider_error_converts_into_error() {
        let err: Error = ProviderError::NotFound("DOGE".into()).into();
        assert!(matches!(err, Error::Provider(ProviderError::NotFound(_))));
    }
}
