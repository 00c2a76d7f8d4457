use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Normalise a ticker symbol to upper case, rejecting anything that is not
/// a short alphanumeric token
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(Error::InvalidInput("symbol cannot be empty".into()));
    }
    if symbol.len() > 12 || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidInput(format!("invalid symbol '{}'", raw.trim())));
    }
    Ok(symbol)
}

pub mod market {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct PriceQuote {
        pub symbol: String,
        pub price_usd: f64,
        pub change_24h_pct: f64,
        pub volume_24h: f64,
        pub market_cap: Option<f64>,
        pub source: String,
        pub timestamp: DateTime<Utc>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Candle {
        pub open_time: DateTime<Utc>,
        pub open: f64,
        pub high: f64,
        pub low: f64,
        pub close: f64,
        pub volume: f64,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct MarketSnapshot {
        pub symbol: String,
        pub price_usd: f64,
        pub change_24h_pct: f64,
        pub volume_24h: f64,
        pub market_cap: Option<f64>,
    }

    impl From<PriceQuote> for MarketSnapshot {
        fn from(quote: PriceQuote) -> Self {
            Self {
                symbol: quote.symbol,
                price_usd: quote.price_usd,
                change_24h_pct: quote.change_24h_pct,
                volume_24h: quote.volume_24h,
                market_cap: quote.market_cap,
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct MarketOverview {
        pub assets: Vec<MarketSnapshot>,
        pub total_market_cap: f64,
        pub total_volume_24h: f64,
        pub source: String,
        pub timestamp: DateTime<Utc>,
    }

    impl MarketOverview {
        pub fn from_snapshots(assets: Vec<MarketSnapshot>, source: impl Into<String>) -> Self {
            let total_market_cap = assets.iter().filter_map(|a| a.market_cap).sum();
            let total_volume_24h = assets.iter().map(|a| a.volume_24h).sum();
            Self {
                assets,
                total_market_cap,
                total_volume_24h,
                source: source.into(),
                timestamp: Utc::now(),
            }
        }
    }

    /// Candle width
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum Interval {
        #[serde(rename = "1m")]
        OneMinute,
        #[serde(rename = "5m")]
        FiveMinutes,
        #[serde(rename = "15m")]
        FifteenMinutes,
        #[default]
        #[serde(rename = "1h")]
        OneHour,
        #[serde(rename = "4h")]
        FourHours,
        #[serde(rename = "1d")]
        OneDay,
        #[serde(rename = "1w")]
        OneWeek,
    }

    impl Interval {
        pub fn as_str(&self) -> &'static str {
            match self {
                Interval::OneMinute => "1m",
                Interval::FiveMinutes => "5m",
                Interval::FifteenMinutes => "15m",
                Interval::OneHour => "1h",
                Interval::FourHours => "4h",
                Interval::OneDay => "1d",
                Interval::OneWeek => "1w",
            }
        }

        pub fn seconds(&self) -> i64 {
            match self {
                Interval::OneMinute => 60,
                Interval::FiveMinutes => 300,
                Interval::FifteenMinutes => 900,
                Interval::OneHour => 3_600,
                Interval::FourHours => 14_400,
                Interval::OneDay => 86_400,
                Interval::OneWeek => 604_800,
            }
        }
    }

    impl fmt::Display for Interval {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for Interval {
        type Err = Error;

        fn from_str(s: &str) -> Result<Self> {
            match s.trim().to_lowercase().as_str() {
                "1m" => Ok(Interval::OneMinute),
                "5m" => Ok(Interval::FiveMinutes),
                "15m" => Ok(Interval::FifteenMinutes),
                "1h" => Ok(Interval::OneHour),
                "4h" => Ok(Interval::FourHours),
                "1d" => Ok(Interval::OneDay),
                "1w" => Ok(Interval::OneWeek),
                other => Err(Error::InvalidInput(format!(
                    "invalid interval '{other}'. Must be one of 1m, 5m, 15m, 1h, 4h, 1d, 1w"
                ))),
            }
        }
    }
}

pub mod portfolio {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Holding {
        pub symbol: String,
        pub quantity: f64,
        pub cost_basis_usd: f64,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Portfolio {
        pub id: String,
        pub owner: String,
        pub holdings: Vec<Holding>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, Serialize)]
    pub struct PositionValuation {
        pub symbol: String,
        pub quantity: f64,
        pub price_usd: f64,
        pub value_usd: f64,
        pub cost_basis_usd: f64,
        pub pnl_usd: f64,
        pub pnl_pct: f64,
        pub allocation_pct: f64,
    }

    #[derive(Clone, Debug, Serialize)]
    pub struct PortfolioValuation {
        pub portfolio_id: String,
        pub positions: Vec<PositionValuation>,
        pub total_value_usd: f64,
        pub total_cost_usd: f64,
        pub pnl_usd: f64,
        pub pnl_pct: f64,
        pub valued_at: DateTime<Utc>,
    }
}

pub mod strategy {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RiskProfile {
        Conservative,
        Moderate,
        Aggressive,
    }

    impl RiskProfile {
        /// Largest share any single asset may take, in percent
        pub fn max_position_pct(&self) -> f64 {
            match self {
                RiskProfile::Conservative => 40.0,
                RiskProfile::Moderate => 35.0,
                RiskProfile::Aggressive => 30.0,
            }
        }
    }

    impl FromStr for RiskProfile {
        type Err = Error;

        fn from_str(s: &str) -> Result<Self> {
            match s.trim().to_lowercase().as_str() {
                "conservative" | "low" => Ok(RiskProfile::Conservative),
                "moderate" | "medium" | "balanced" => Ok(RiskProfile::Moderate),
                "aggressive" | "high" => Ok(RiskProfile::Aggressive),
                other => Err(Error::InvalidInput(format!("invalid risk profile '{other}'"))),
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct Allocation {
        pub symbol: String,
        pub weight_pct: f64,
        pub amount_usd: f64,
    }

    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct DcaInstalment {
        pub month: u32,
        pub amount_usd: f64,
    }

    #[derive(Clone, Debug, Serialize)]
    pub struct StrategySuggestion {
        pub id: String,
        pub risk_profile: RiskProfile,
        pub amount_usd: f64,
        pub horizon_months: u32,
        pub allocations: Vec<Allocation>,
        pub dca_schedule: Vec<DcaInstalment>,
        pub rationale: Vec<String>,
        pub confidence: f64,
        pub generated_at: DateTime<Utc>,
    }
}

pub mod intent {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum Intent {
        Investment,
        Trading,
        PortfolioReview,
        MarketInfo,
        RiskAssessment,
        Education,
        Unknown,
    }

    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct IntentClassification {
        pub intent: Intent,
        pub confidence: f64,
        pub matched_keywords: Vec<String>,
        pub symbols: Vec<String>,
    }
}

/// Snapshot of cache counters
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::market::Interval;
    use super::strategy::RiskProfile;
    use super::*;

    #[test]
    fn test_symbols_are_upper_cased_and_validated() {
        assert_eq!(normalize_symbol(" btc ").unwrap(), "BTC");
        assert!(matches!(normalize_symbol(""), Err(Error::InvalidInput(_))));
        assert!(matches!(normalize_symbol("BTC/USD"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_interval_parses_known_widths() {
        for raw in ["1m", "5m", "15m", "1h", "4h", "1d", "1w"] {
            let interval: Interval = raw.parse().unwrap();
            assert_eq!(interval.to_string(), raw);
        }
        assert!("2h".parse::<Interval>().is_err());
    }

    #[test]
    fn test_risk_profile_accepts_aliases() {
        assert_eq!("LOW".parse::<RiskProfile>().unwrap(), RiskProfile::Conservative);
        assert_eq!("balanced".parse::<RiskProfile>().unwrap(), RiskProfile::Moderate);
        assert!("yolo".parse::<RiskProfile>().is_err());
    }
}
