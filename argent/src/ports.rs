use crate::domain::market::{Candle, Interval, MarketOverview, MarketSnapshot, PriceQuote};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::ProviderError;
use std::sync::Arc;

// Ports are the pluggable extension points for market-data backends

/// Capability set every market-data backend exposes
#[async_trait]
pub trait MarketDataProvider: Send + Sync + 'static {
    /// Short identifier used in logs and in the `source` field of results
    fn name(&self) -> &str;

    async fn fetch_price(&self, symbol: &str) -> Result<PriceQuote, ProviderError>;

    async fn fetch_historical(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, ProviderError>;

    async fn fetch_market_data(
        &self,
        symbols: &[String],
    ) -> Result<Vec<MarketSnapshot>, ProviderError>;
}

pub type SharedProvider = Arc<dyn MarketDataProvider>;

/// A single request that can be replayed against any provider.
///
/// The resolver only sees this abstraction, so the same cache-and-fallback
/// path serves every kind of market data.
#[async_trait]
pub trait MarketQuery: Send + Sync {
    type Output: Serialize + DeserializeOwned + Send;

    async fn execute(
        &self,
        provider: &dyn MarketDataProvider,
    ) -> Result<Self::Output, ProviderError>;
}

#[derive(Clone, Debug)]
pub struct PriceQuery {
    pub symbol: String,
}

#[async_trait]
impl MarketQuery for PriceQuery {
    type Output = PriceQuote;

    async fn execute(
        &self,
        provider: &dyn MarketDataProvider,
    ) -> Result<PriceQuote, ProviderError> {
        provider.fetch_price(&self.symbol).await
    }
}

#[derive(Clone, Debug)]
pub struct HistoricalQuery {
    pub symbol: String,
    pub interval: Interval,
    pub limit: usize,
}

#[async_trait]
impl MarketQuery for HistoricalQuery {
    type Output = Vec<Candle>;

    async fn execute(
        &self,
        provider: &dyn MarketDataProvider,
    ) -> Result<Vec<Candle>, ProviderError> {
        provider
            .fetch_historical(&self.symbol, self.interval, self.limit)
            .await
    }
}

#[derive(Clone, Debug)]
pub struct MarketDataQuery {
    pub symbols: Vec<String>,
}

/// Overview results carry the name of whichever provider answered
#[async_trait]
impl MarketQuery for MarketDataQuery {
    type Output = MarketOverview;

    async fn execute(
        &self,
        provider: &dyn MarketDataProvider,
    ) -> Result<MarketOverview, ProviderError> {
        let snapshots = provider.fetch_market_data(&self.symbols).await?;
        Ok(MarketOverview::from_snapshots(snapshots, provider.name()))
    }
}
