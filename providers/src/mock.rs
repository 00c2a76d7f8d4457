//! Deterministic-when-seeded market simulator used for local development
//! and tests. No network access.

use argent::domain::market::{Candle, Interval, MarketSnapshot, PriceQuote};
use argent::ports::MarketDataProvider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::ProviderError;
use std::sync::Mutex;
use tracing::debug;

pub const NAME: &str = "mock";

/// Reference price and circulating supply per asset
const BASE_MARKET: &[(&str, f64, f64)] = &[
    ("BTC", 64_000.0, 19_700_000.0),
    ("ETH", 3_100.0, 120_000_000.0),
    ("SOL", 145.0, 460_000_000.0),
    ("BNB", 580.0, 150_000_000.0),
    ("XRP", 0.52, 55_000_000_000.0),
    ("ADA", 0.45, 35_000_000_000.0),
    ("DOGE", 0.12, 144_000_000_000.0),
    ("AVAX", 28.0, 390_000_000.0),
    ("DOT", 6.5, 1_400_000_000.0),
    ("LINK", 14.0, 590_000_000.0),
    ("MATIC", 0.55, 9_300_000_000.0),
    ("ATOM", 7.8, 390_000_000.0),
    ("LTC", 72.0, 74_000_000.0),
    ("USDT", 1.0, 110_000_000_000.0),
    ("USDC", 1.0, 33_000_000_000.0),
];

fn base_market(symbol: &str) -> Option<(f64, f64)> {
    BASE_MARKET
        .iter()
        .find(|(s, _, _)| s.eq_ignore_ascii_case(symbol))
        .map(|(_, price, supply)| (*price, *supply))
}

pub struct MockProvider {
    rng: Mutex<StdRng>,
    failure_rate: f64,
}

impl MockProvider {
    /// `Some(seed)` makes every sequence of calls reproducible
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
            failure_rate: 0.0,
        }
    }

    /// Fail this fraction of calls with a simulated outage, clamped to `0.0..=1.0`
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        self
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }

    fn maybe_fail(&self) -> Result<(), ProviderError> {
        if self.failure_rate <= 0.0 {
            return Ok(());
        }
        let roll: f64 = self.with_rng(|rng| rng.random());
        if roll < self.failure_rate {
            debug!("mock provider simulating outage");
            return Err(ProviderError::Network("simulated outage".into()));
        }
        Ok(())
    }

    fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, ProviderError> {
        let (base, supply) = base_market(symbol)
            .ok_or_else(|| ProviderError::UnsupportedSymbol(symbol.to_string()))?;

        let (drift, change, turnover) = self.with_rng(|rng| {
            (
                rng.random_range(-0.03..=0.03),
                rng.random_range(-8.0..=8.0),
                rng.random_range(0.02..=0.08),
            )
        });
        let price = round_price(base * (1.0 + drift));
        let market_cap = price * supply;

        Ok(MarketSnapshot {
            symbol: symbol.to_uppercase(),
            price_usd: price,
            change_24h_pct: round2(change),
            volume_24h: round2(market_cap * turnover),
            market_cap: Some(round2(market_cap)),
        })
    }

    fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Candle>, ProviderError> {
        let (base, supply) = base_market(symbol)
            .ok_or_else(|| ProviderError::UnsupportedSymbol(symbol.to_string()))?;

        let step = interval.seconds();
        let aligned = now.timestamp() - now.timestamp().rem_euclid(step);
        let first = aligned - step * (limit as i64 - 1);

        self.with_rng(|rng| {
            let mut close = base;
            (0..limit as i64)
                .map(|i| {
                    let open = close;
                    close = round_price(open * (1.0 + rng.random_range(-0.02..=0.02)));
                    let high = round_price(open.max(close) * (1.0 + rng.random_range(0.0..=0.01)));
                    let low = round_price(open.min(close) * (1.0 - rng.random_range(0.0..=0.01)));
                    let open_time = DateTime::<Utc>::from_timestamp(first + i * step, 0)
                        .ok_or_else(|| {
                            ProviderError::Malformed("candle time out of range".into())
                        })?;
                    Ok(Candle {
                        open_time,
                        open,
                        high,
                        low,
                        close,
                        volume: round2(supply * close * rng.random_range(0.0005..=0.002)),
                    })
                })
                .collect()
        })
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch_price(&self, symbol: &str) -> Result<PriceQuote, ProviderError> {
        self.maybe_fail()?;
        let snapshot = self.snapshot(symbol)?;
        Ok(PriceQuote {
            symbol: snapshot.symbol,
            price_usd: snapshot.price_usd,
            change_24h_pct: snapshot.change_24h_pct,
            volume_24h: snapshot.volume_24h,
            market_cap: snapshot.market_cap,
            source: NAME.to_string(),
            timestamp: Utc::now(),
        })
    }

    async fn fetch_historical(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        self.maybe_fail()?;
        self.candles(symbol, interval, limit, Utc::now())
    }

    async fn fetch_market_data(
        &self,
        symbols: &[String],
    ) -> Result<Vec<MarketSnapshot>, ProviderError> {
        self.maybe_fail()?;
        symbols.iter().map(|s| self.snapshot(s)).collect()
    }
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("failure_rate", &self.failure_rate)
            .finish()
    }
}

/// Sub-dollar assets keep more precision
fn round_price(value: f64) -> f64 {
    if value < 1.0 {
        (value * 1_000_000.0).round() / 1_000_000.0
    } else {
        round2(value)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
