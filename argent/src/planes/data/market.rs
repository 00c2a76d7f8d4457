use super::resolver::ProviderResolver;
use crate::domain::market::{Candle, Interval, MarketOverview, PriceQuote};
use crate::domain::normalize_symbol;
use crate::ports::{HistoricalQuery, MarketDataQuery, PriceQuery, SharedProvider};
use futures::future::try_join_all;
use shared::config::MarketSettings;
use shared::{Error, Result};
use tracing::info;

pub const DEFAULT_WATCHLIST: &[&str] = &[
    "BTC", "ETH", "SOL", "BNB", "XRP", "ADA", "DOGE", "AVAX", "DOT", "LINK",
];

pub const MAX_BATCH_SYMBOLS: usize = 50;
const MAX_HISTORICAL_LIMIT: usize = 1000;

/// Entry point for market data; every lookup goes through the resolver
#[derive(Clone)]
pub struct MarketService {
    resolver: ProviderResolver,
    primary: SharedProvider,
    fallback: Option<SharedProvider>,
    settings: MarketSettings,
}

impl MarketService {
    pub fn new(
        resolver: ProviderResolver,
        primary: SharedProvider,
        fallback: Option<SharedProvider>,
        settings: MarketSettings,
    ) -> Self {
        info!(
            "Market service using primary '{}' with fallback '{}'",
            primary.name(),
            fallback.as_ref().map(|f| f.name()).unwrap_or("none")
        );
        Self {
            resolver,
            primary,
            fallback,
            settings,
        }
    }

    pub fn resolver(&self) -> &ProviderResolver {
        &self.resolver
    }

    pub fn provider_names(&self) -> (String, Option<String>) {
        (
            self.primary.name().to_string(),
            self.fallback.as_ref().map(|f| f.name().to_string()),
        )
    }

    pub async fn price(&self, symbol: &str) -> Result<PriceQuote> {
        let symbol = normalize_symbol(symbol)?;
        let key = format!("price:{symbol}");

        self.resolver
            .resolve(
                &key,
                &PriceQuery { symbol },
                self.primary.as_ref(),
                self.fallback.as_deref(),
                Some(self.settings.price_ttl),
            )
            .await
    }

    /// Quotes for a caller-supplied batch of at most `MAX_BATCH_SYMBOLS`;
    /// fails if any single symbol cannot be resolved
    pub async fn prices(&self, symbols: &[String]) -> Result<Vec<PriceQuote>> {
        check_batch_size(symbols)?;
        self.quotes(symbols).await
    }

    /// Same as `prices` without the batch cap, for internal callers such as
    /// portfolio valuation whose symbol sets are not request-bounded
    pub async fn quotes(&self, symbols: &[String]) -> Result<Vec<PriceQuote>> {
        let symbols = normalize_symbols(symbols)?;
        try_join_all(symbols.iter().map(|s| self.price(s))).await
    }

    pub async fn historical(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let symbol = normalize_symbol(symbol)?;
        if limit == 0 || limit > MAX_HISTORICAL_LIMIT {
            return Err(Error::InvalidInput(format!(
                "limit must be between 1 and {MAX_HISTORICAL_LIMIT}"
            )));
        }
        let key = format!("historical:{symbol}:{interval}:{limit}");

        self.resolver
            .resolve(
                &key,
                &HistoricalQuery {
                    symbol,
                    interval,
                    limit,
                },
                self.primary.as_ref(),
                self.fallback.as_deref(),
                Some(self.settings.historical_ttl),
            )
            .await
    }

    /// Market snapshot for `symbols`, or for the default watchlist when empty
    pub async fn overview(&self, symbols: &[String]) -> Result<MarketOverview> {
        let symbols = if symbols.is_empty() {
            DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect()
        } else {
            check_batch_size(symbols)?;
            normalize_symbols(symbols)?
        };
        let key = format!("overview:{}", symbols.join(","));

        self.resolver
            .resolve(
                &key,
                &MarketDataQuery { symbols },
                self.primary.as_ref(),
                self.fallback.as_deref(),
                Some(self.settings.overview_ttl),
            )
            .await
    }
}

fn check_batch_size(symbols: &[String]) -> Result<()> {
    if symbols.len() > MAX_BATCH_SYMBOLS {
        return Err(Error::InvalidInput(format!(
            "at most {MAX_BATCH_SYMBOLS} symbols per request"
        )));
    }
    Ok(())
}

/// Upper-case, validate and de-duplicate symbols, keeping first-seen order
fn normalize_symbols(symbols: &[String]) -> Result<Vec<String>> {
    if symbols.is_empty() {
        return Err(Error::InvalidInput("at least one symbol is required".into()));
    }

    let mut normalized: Vec<String> = Vec::with_capacity(symbols.len());
    for raw in symbols {
        let symbol = normalize_symbol(raw)?;
        if !normalized.contains(&symbol) {
            normalized.push(symbol);
        }
    }
    Ok(normalized)
}

impl std::fmt::Debug for MarketService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketService")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.as_ref().map(|p| p.name()))
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::MarketCache;
    use crate::domain::market::MarketSnapshot;
    use crate::ports::MarketDataProvider;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use shared::ProviderError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Provider answering from a fixed price table
    pub(crate) struct TableProvider {
        pub prices: HashMap<String, (f64, f64)>,
        pub calls: AtomicUsize,
    }

    impl TableProvider {
        pub(crate) fn new(entries: &[(&str, f64, f64)]) -> Self {
            Self {
                prices: entries
                    .iter()
                    .map(|(s, p, c)| (s.to_string(), (*p, *c)))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }

        fn lookup(&self, symbol: &str) -> std::result::Result<(f64, f64), ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prices
                .get(symbol)
                .copied()
                .ok_or_else(|| ProviderError::UnsupportedSymbol(symbol.to_string()))
        }
    }

    #[async_trait]
    impl MarketDataProvider for TableProvider {
        fn name(&self) -> &str {
            "table"
        }

        async fn fetch_price(
            &self,
            symbol: &str,
        ) -> std::result::Result<PriceQuote, ProviderError> {
            let (price, change) = self.lookup(symbol)?;
            Ok(PriceQuote {
                symbol: symbol.to_string(),
                price_usd: price,
                change_24h_pct: change,
                volume_24h: price * 1000.0,
                market_cap: Some(price * 1_000_000.0),
                source: "table".into(),
                timestamp: Utc::now(),
            })
        }

        async fn fetch_historical(
            &self,
            symbol: &str,
            interval: Interval,
            limit: usize,
        ) -> std::result::Result<Vec<Candle>, ProviderError> {
            let (price, _) = self.lookup(symbol)?;
            let start = Utc::now() - ChronoDuration::seconds(interval.seconds() * limit as i64);
            Ok((0..limit)
                .map(|i| Candle {
                    open_time: start + ChronoDuration::seconds(interval.seconds() * i as i64),
                    open: price,
                    high: price,
                    low: price,
                    close: price,
                    volume: 1.0,
                })
                .collect())
        }

        async fn fetch_market_data(
            &self,
            symbols: &[String],
        ) -> std::result::Result<Vec<MarketSnapshot>, ProviderError> {
            let mut snapshots: Vec<MarketSnapshot> = Vec::new();
            for symbol in symbols {
                snapshots.push(self.fetch_price(symbol).await?.into());
            }
            Ok(snapshots)
        }
    }

    pub(crate) fn market_service(provider: Arc<TableProvider>) -> MarketService {
        let cache = Arc::new(MarketCache::new(100, Duration::from_secs(60)));
        let resolver = ProviderResolver::new(cache, Duration::from_secs(1));
        MarketService::new(
            resolver,
            provider,
            None,
            MarketSettings {
                price_ttl: Duration::from_secs(30),
                historical_ttl: Duration::from_secs(300),
                overview_ttl: Duration::from_secs(60),
            },
        )
    }

    #[tokio::test]
    async fn test_price_normalizes_symbol_and_caches_under_namespaced_key() {
        let provider = Arc::new(TableProvider::new(&[("BTC", 50_000.0, 1.5)]));
        let service = market_service(provider.clone());

        let quote = service.price("btc").await.unwrap();
        assert_eq!(quote.symbol, "BTC");
        service.price("BTC").await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(service.resolver().cache().has(&"price:BTC".to_string()));
    }

    #[tokio::test]
    async fn test_prices_deduplicates_symbols() {
        let provider = Arc::new(TableProvider::new(&[("BTC", 1.0, 0.0), ("ETH", 2.0, 0.0)]));
        let service = market_service(provider);

        let quotes = service
            .prices(&["eth".into(), "BTC".into(), "ETH".into()])
            .await
            .unwrap();

        let symbols: Vec<_> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETH", "BTC"]);
    }

    #[tokio::test]
    async fn test_invalid_inputs_are_rejected_before_any_provider_call() {
        let provider = Arc::new(TableProvider::new(&[("BTC", 1.0, 0.0)]));
        let service = market_service(provider.clone());

        assert!(matches!(
            service.price("BTC-USD").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            service.historical("BTC", Interval::OneHour, 0).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            service.historical("BTC", Interval::OneHour, 1001).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(service.prices(&[]).await, Err(Error::InvalidInput(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batch_cap_applies_to_prices_but_not_quotes() {
        let names: Vec<String> = (0..=MAX_BATCH_SYMBOLS).map(|i| format!("C{i}")).collect();
        let entries: Vec<(&str, f64, f64)> = names.iter().map(|s| (s.as_str(), 1.0, 0.0)).collect();
        let provider = Arc::new(TableProvider::new(&entries));
        let service = market_service(provider.clone());

        assert!(matches!(service.prices(&names).await, Err(Error::InvalidInput(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

        let quotes = service.quotes(&names).await.unwrap();
        assert_eq!(quotes.len(), MAX_BATCH_SYMBOLS + 1);
    }

    #[tokio::test]
    async fn test_historical_returns_requested_number_of_candles() {
        let provider = Arc::new(TableProvider::new(&[("SOL", 150.0, 0.0)]));
        let service = market_service(provider);

        let candles = service.historical("sol", Interval::OneDay, 7).await.unwrap();
        assert_eq!(candles.len(), 7);
        assert!(candles.windows(2).all(|w| w[0].open_time < w[1].open_time));
    }

    #[tokio::test]
    async fn test_overview_totals_and_source() {
        let provider = Arc::new(TableProvider::new(&[("BTC", 10.0, 0.0), ("ETH", 5.0, 0.0)]));
        let service = market_service(provider);

        let overview = service
            .overview(&["BTC".into(), "ETH".into()])
            .await
            .unwrap();

        assert_eq!(overview.assets.len(), 2);
        assert_eq!(overview.total_volume_24h, 15_000.0);
        assert_eq!(overview.total_market_cap, 15_000_000.0);
        assert_eq!(overview.source, "table");
    }

    #[tokio::test]
    async fn test_unknown_symbol_surfaces_provider_error() {
        let provider = Arc::new(TableProvider::new(&[]));
        let service = market_service(provider);

        let err = service.price("XYZ").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Provider(ProviderError::UnsupportedSymbol(_))
        ));
    }
}
