use crate::cache::MarketCache;
use crate::ports::{MarketDataProvider, MarketQuery};
use shared::{Error, ProviderError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Serves market data from the cache, falling back from the primary
/// provider to the secondary one on a miss.
///
/// Each provider is tried at most once per call. Concurrent misses on the
/// same key each go to the providers; the last successful write wins.
#[derive(Clone)]
pub struct ProviderResolver {
    cache: Arc<MarketCache>,
    timeout: Duration,
}

impl ProviderResolver {
    pub fn new(cache: Arc<MarketCache>, timeout: Duration) -> Self {
        Self { cache, timeout }
    }

    pub fn cache(&self) -> &Arc<MarketCache> {
        &self.cache
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn resolve<Q>(
        &self,
        cache_key: &str,
        query: &Q,
        primary: &dyn MarketDataProvider,
        fallback: Option<&dyn MarketDataProvider>,
        ttl: Option<Duration>,
    ) -> Result<Q::Output>
    where
        Q: MarketQuery,
    {
        let key = cache_key.to_string();

        let cached = self.cache.get_with(&key, |value| {
            serde_json::from_value::<Q::Output>(value.clone())
                .inspect_err(|e| warn!("Discarding undecodable cache entry '{}': {}", cache_key, e))
                .ok()
        });
        if let Some(value) = cached {
            debug!("Cache hit for '{}'", cache_key);
            return Ok(value);
        }
        debug!("Cache miss for '{}'", cache_key);

        let primary_err = match self.attempt(query, primary).await {
            Ok(value) => return Ok(self.store(key, value, ttl)),
            Err(e) => e,
        };
        warn!(
            "Primary provider '{}' failed for '{}': {}",
            primary.name(),
            cache_key,
            primary_err
        );

        let Some(fallback) = fallback else {
            return Err(Error::Provider(primary_err));
        };

        match self.attempt(query, fallback).await {
            Ok(value) => {
                debug!(
                    "Fallback provider '{}' served '{}'",
                    fallback.name(),
                    cache_key
                );
                Ok(self.store(key, value, ttl))
            }
            Err(fallback_err) => {
                error!(
                    "All providers failed for '{}': {}: {}; {}: {}",
                    cache_key,
                    primary.name(),
                    primary_err,
                    fallback.name(),
                    fallback_err
                );
                Err(Error::AllProvidersFailed {
                    primary: format!("{}: {}", primary.name(), primary_err),
                    fallback: format!("{}: {}", fallback.name(), fallback_err),
                })
            }
        }
    }

    async fn attempt<Q>(
        &self,
        query: &Q,
        provider: &dyn MarketDataProvider,
    ) -> std::result::Result<Q::Output, ProviderError>
    where
        Q: MarketQuery,
    {
        match tokio::time::timeout(self.timeout, query.execute(provider)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        }
    }

    fn store<T>(&self, key: String, value: T, ttl: Option<Duration>) -> T
    where
        T: serde::Serialize,
    {
        match serde_json::to_value(&value) {
            Ok(json) => self.cache.set(key, json, ttl),
            Err(e) => warn!("Not caching '{}': {}", key, e),
        }
        value
    }
}

impl std::fmt::Debug for ProviderResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderResolver")
            .field("cache", &self.cache)
            .field("timeout", &self.timeout)
            .finish()
    }
}
