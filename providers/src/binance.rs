//! Binance spot market client. Prices are read from the USDT pairs.

use crate::http::{get_json, parse_decimal};
use crate::symbols::{binance_pair, symbol_for_binance_pair};
use argent::domain::market::{Candle, Interval, MarketSnapshot, PriceQuote};
use argent::ports::MarketDataProvider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use shared::ProviderError;
use std::time::Duration;

pub const NAME: &str = "binance";

const MAX_KLINES: usize = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Ticker24h {
    symbol: String,
    last_price: String,
    price_change_percent: String,
    quote_volume: String,
}

#[derive(Debug, Clone)]
pub struct BinanceProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl BinanceProvider {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .timeout(self.timeout)
    }

    fn pair(symbol: &str) -> Result<String, ProviderError> {
        binance_pair(symbol).ok_or_else(|| ProviderError::UnsupportedSymbol(symbol.to_string()))
    }
}

/// Binance answers unknown pairs with 400 rather than 404
fn unsupported_on_bad_request(err: ProviderError, symbol: &str) -> ProviderError {
    match err {
        ProviderError::Http { status: 400, .. } => {
            ProviderError::UnsupportedSymbol(symbol.to_string())
        }
        other => other,
    }
}

#[async_trait]
impl MarketDataProvider for BinanceProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch_price(&self, symbol: &str) -> Result<PriceQuote, ProviderError> {
        let pair = Self::pair(symbol)?;
        let request = self
            .get("/api/v3/ticker/24hr")
            .query(&[("symbol", pair.as_str())]);

        let ticker: Ticker24h = get_json(request, NAME, self.timeout)
            .await
            .map_err(|e| unsupported_on_bad_request(e, symbol))?;
        quote_from_ticker(&ticker)
    }

    async fn fetch_historical(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        let pair = Self::pair(symbol)?;
        let limit = limit.clamp(1, MAX_KLINES).to_string();
        let request = self.get("/api/v3/klines").query(&[
            ("symbol", pair.as_str()),
            ("interval", interval.as_str()),
            ("limit", limit.as_str()),
        ]);

        let rows: Vec<Vec<Value>> = get_json(request, NAME, self.timeout)
            .await
            .map_err(|e| unsupported_on_bad_request(e, symbol))?;
        rows.iter().map(|row| candle_from_kline(row)).collect()
    }

    async fn fetch_market_data(
        &self,
        symbols: &[String],
    ) -> Result<Vec<MarketSnapshot>, ProviderError> {
        let pairs = symbols
            .iter()
            .map(|s| Self::pair(s))
            .collect::<Result<Vec<_>, _>>()?;
        let pairs = serde_json::to_string(&pairs)
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let request = self
            .get("/api/v3/ticker/24hr")
            .query(&[("symbols", pairs.as_str())]);

        let tickers: Vec<Ticker24h> = get_json(request, NAME, self.timeout)
            .await
            .map_err(|e| unsupported_on_bad_request(e, &symbols.join(",")))?;

        snapshots_from_tickers(symbols, &tickers)
    }
}

/// Snapshots in request order; none matching any symbol is `NotFound`
pub(crate) fn snapshots_from_tickers(
    symbols: &[String],
    tickers: &[Ticker24h],
) -> Result<Vec<MarketSnapshot>, ProviderError> {
    let mut snapshots = Vec::with_capacity(tickers.len());
    for symbol in symbols {
        let pair = BinanceProvider::pair(symbol)?;
        if let Some(ticker) = tickers.iter().find(|t| t.symbol == pair) {
            snapshots.push(MarketSnapshot::from(quote_from_ticker(ticker)?));
        }
    }
    if snapshots.is_empty() {
        return Err(ProviderError::NotFound(symbols.join(",")));
    }
    Ok(snapshots)
}

pub(crate) fn quote_from_ticker(ticker: &Ticker24h) -> Result<PriceQuote, ProviderError> {
    let symbol = symbol_for_binance_pair(&ticker.symbol)
        .ok_or_else(|| ProviderError::Malformed(format!("unexpected pair {}", ticker.symbol)))?;

    Ok(PriceQuote {
        symbol: symbol.to_string(),
        price_usd: parse_decimal(&ticker.last_price, "lastPrice")?,
        change_24h_pct: parse_decimal(&ticker.price_change_percent, "priceChangePercent")?,
        volume_24h: parse_decimal(&ticker.quote_volume, "quoteVolume")?,
        // Binance does not publish market cap
        market_cap: None,
        source: NAME.to_string(),
        timestamp: Utc::now(),
    })
}

/// `[openTime, open, high, low, close, volume, closeTime, ...]`
pub(crate) fn candle_from_kline(row: &[Value]) -> Result<Candle, ProviderError> {
    if row.len() < 6 {
        return Err(ProviderError::Malformed(format!(
            "kline has {} fields, expected at least 6",
            row.len()
        )));
    }

    let open_time = row[0]
        .as_i64()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| ProviderError::Malformed("kline open time".into()))?;
    let field = |idx: usize, name: &str| -> Result<f64, ProviderError> {
        match &row[idx] {
            Value::String(raw) => parse_decimal(raw, name),
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| ProviderError::Malformed(format!("{name} out of range"))),
            _ => Err(ProviderError::Malformed(format!("{name} is not a number"))),
        }
    };

    Ok(Candle {
        open_time,
        open: field(1, "open")?,
        high: field(2, "high")?,
        low: field(3, "low")?,
        close: field(4, "close")?,
        volume: field(5, "volume")?,
    })
}
