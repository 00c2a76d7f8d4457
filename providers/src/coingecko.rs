//! CoinGecko public API client
//!
//! Uses `/simple/price` for quotes, `/coins/{id}/ohlc` for candles and
//! `/coins/markets` for overviews.

use crate::http::get_json;
use crate::symbols::{coingecko_id, symbol_for_coingecko_id};
use argent::domain::market::{Candle, Interval, MarketSnapshot, PriceQuote};
use argent::ports::MarketDataProvider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared::ProviderError;
use std::collections::HashMap;
use std::time::Duration;

pub const NAME: &str = "coingecko";

/// Day ranges accepted by the OHLC endpoint
const OHLC_DAYS: &[u32] = &[1, 7, 14, 30, 90, 180, 365];

#[derive(Debug, Deserialize)]
pub(crate) struct SimplePrice {
    usd: f64,
    #[serde(default)]
    usd_24h_change: Option<f64>,
    #[serde(default)]
    usd_24h_vol: Option<f64>,
    #[serde(default)]
    usd_market_cap: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarketRow {
    id: String,
    symbol: String,
    current_price: Option<f64>,
    #[serde(default)]
    price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    total_volume: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl CoinGeckoProvider {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            timeout,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .timeout(self.timeout);
        match &self.api_key {
            Some(key) => request.header("x-cg-demo-api-key", key),
            None => request,
        }
    }

    fn coin_id(symbol: &str) -> Result<&'static str, ProviderError> {
        coingecko_id(symbol).ok_or_else(|| ProviderError::UnsupportedSymbol(symbol.to_string()))
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch_price(&self, symbol: &str) -> Result<PriceQuote, ProviderError> {
        let id = Self::coin_id(symbol)?;
        let request = self.get("/simple/price").query(&[
            ("ids", id),
            ("vs_currencies", "usd"),
            ("include_24hr_change", "true"),
            ("include_24hr_vol", "true"),
            ("include_market_cap", "true"),
        ]);

        let body: HashMap<String, SimplePrice> = get_json(request, NAME, self.timeout).await?;
        quote_from_simple_price(body, id, symbol)
    }

    /// CoinGecko picks the candle width from the day range, so the returned
    /// candles approximate `interval` rather than match it exactly
    async fn fetch_historical(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        let id = Self::coin_id(symbol)?;
        let days = ohlc_days(interval, limit).to_string();
        let request = self
            .get(&format!("/coins/{id}/ohlc"))
            .query(&[("vs_currency", "usd"), ("days", days.as_str())]);

        let rows: Vec<[f64; 5]> = get_json(request, NAME, self.timeout).await?;
        candles_from_ohlc(rows, limit)
    }

    async fn fetch_market_data(
        &self,
        symbols: &[String],
    ) -> Result<Vec<MarketSnapshot>, ProviderError> {
        let ids = symbols
            .iter()
            .map(|s| Self::coin_id(s))
            .collect::<Result<Vec<_>, _>>()?
            .join(",");
        let request = self
            .get("/coins/markets")
            .query(&[("vs_currency", "usd"), ("ids", ids.as_str())]);

        let rows: Vec<MarketRow> = get_json(request, NAME, self.timeout).await?;
        snapshots_from_markets(rows, symbols)
    }
}

/// Smallest accepted day range covering `limit` candles of `interval`
pub(crate) fn ohlc_days(interval: Interval, limit: usize) -> u32 {
    let span_secs = interval.seconds() * limit as i64;
    let needed = ((span_secs + 86_399) / 86_400).max(1) as u32;
    OHLC_DAYS
        .iter()
        .copied()
        .find(|d| *d >= needed)
        .unwrap_or(365)
}

pub(crate) fn quote_from_simple_price(
    mut body: HashMap<String, SimplePrice>,
    id: &str,
    symbol: &str,
) -> Result<PriceQuote, ProviderError> {
    let price = body
        .remove(id)
        .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;

    Ok(PriceQuote {
        symbol: symbol.to_uppercase(),
        price_usd: price.usd,
        change_24h_pct: price.usd_24h_change.unwrap_or(0.0),
        volume_24h: price.usd_24h_vol.unwrap_or(0.0),
        market_cap: price.usd_market_cap,
        source: NAME.to_string(),
        timestamp: Utc::now(),
    })
}

pub(crate) fn candles_from_ohlc(
    rows: Vec<[f64; 5]>,
    limit: usize,
) -> Result<Vec<Candle>, ProviderError> {
    let skip = rows.len().saturating_sub(limit);
    rows.into_iter()
        .skip(skip)
        .map(|[time_ms, open, high, low, close]| {
            let open_time = DateTime::<Utc>::from_timestamp_millis(time_ms as i64)
                .ok_or_else(|| ProviderError::Malformed(format!("bad timestamp {time_ms}")))?;
            Ok(Candle {
                open_time,
                open,
                high,
                low,
                close,
                // OHLC endpoint carries no volume
                volume: 0.0,
            })
        })
        .collect()
}

/// Order rows to follow `symbols`; symbols CoinGecko did not return are skipped
pub(crate) fn snapshots_from_markets(
    rows: Vec<MarketRow>,
    symbols: &[String],
) -> Result<Vec<MarketSnapshot>, ProviderError> {
    let mut by_symbol: HashMap<String, MarketSnapshot> = HashMap::new();
    for row in rows {
        let Some(price) = row.current_price else {
            continue;
        };
        let symbol = symbol_for_coingecko_id(&row.id)
            .map(str::to_string)
            .unwrap_or_else(|| row.symbol.to_uppercase());
        by_symbol.insert(
            symbol.clone(),
            MarketSnapshot {
                symbol,
                price_usd: price,
                change_24h_pct: row.price_change_percentage_24h.unwrap_or(0.0),
                volume_24h: row.total_volume.unwrap_or(0.0),
                market_cap: row.market_cap,
            },
        );
    }

    let snapshots: Vec<MarketSnapshot> = symbols
        .iter()
        .filter_map(|s| by_symbol.remove(&s.to_uppercase()))
        .collect();
    if snapshots.is_empty() {
        return Err(ProviderError::NotFound(symbols.join(",")));
    }
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_from_simple_price() {
        let body: HashMap<String, SimplePrice> = serde_json::from_str(
            r#"{"bitcoin":{"usd":64250.5,"usd_24h_change":-1.25,"usd_24h_vol":31000000000.0,"usd_market_cap":1260000000000.0}}"#,
        )
        .unwrap();

        let quote = quote_from_simple_price(body, "bitcoin", "btc").unwrap();
        assert_eq!(quote.symbol, "BTC");
        assert_eq!(quote.price_usd, 64250.5);
        assert_eq!(quote.change_24h_pct, -1.25);
        assert_eq!(quote.market_cap, Some(1_260_000_000_000.0));
        assert_eq!(quote.source, NAME);
    }

    #[test]
    fn test_missing_coin_is_not_found() {
        let body: HashMap<String, SimplePrice> = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            quote_from_simple_price(body, "bitcoin", "BTC"),
            Err(ProviderError::NotFound(_))
        ));
    }

    #[test]
    fn test_candles_keep_most_recent_rows() {
        let rows: Vec<[f64; 5]> = serde_json::from_str(
            "[[1700000000000,1,2,0.5,1.5],[1700001800000,1.5,2.5,1,2],[1700003600000,2,3,1.5,2.5]]",
        )
        .unwrap();

        let candles = candles_from_ohlc(rows, 2).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 1.5);
        assert_eq!(candles[1].close, 2.5);
        assert_eq!(candles[1].open_time.timestamp(), 1_700_003_600);
    }

    #[test]
    fn test_snapshots_follow_request_order() {
        let rows: Vec<MarketRow> = serde_json::from_str(
            r#"[
                {"id":"bitcoin","symbol":"btc","current_price":64000,"price_change_percentage_24h":1.0,"total_volume":10,"market_cap":100},
                {"id":"ethereum","symbol":"eth","current_price":3100,"price_change_percentage_24h":-2.0,"total_volume":5,"market_cap":null}
            ]"#,
        )
        .unwrap();

        let snapshots = snapshots_from_markets(rows, &["ETH".into(), "BTC".into()]).unwrap();
        assert_eq!(snapshots[0].symbol, "ETH");
        assert_eq!(snapshots[0].market_cap, None);
        assert_eq!(snapshots[1].symbol, "BTC");
    }

    #[test]
    fn test_ohlc_day_range_selection() {
        assert_eq!(ohlc_days(Interval::OneHour, 24), 1);
        assert_eq!(ohlc_days(Interval::OneHour, 100), 7);
        assert_eq!(ohlc_days(Interval::OneDay, 60), 90);
        assert_eq!(ohlc_days(Interval::OneWeek, 1000), 365);
    }

    #[test]
    fn test_unknown_symbol_is_rejected_before_request() {
        assert!(matches!(
            CoinGeckoProvider::coin_id("NOPE"),
            Err(ProviderError::UnsupportedSymbol(_))
        ));
    }
}
