use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Market-data backends the gateway knows how to build
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    CoinGecko,
    Binance,
    Mock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::CoinGecko => "coingecko",
            ProviderKind::Binance => "binance",
            ProviderKind::Mock => "mock",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coingecko" | "gecko" => Ok(ProviderKind::CoinGecko),
            "binance" => Ok(ProviderKind::Binance),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

#[derive(Clone, Debug)]
pub struct CacheSettings {
    pub capacity: usize,
    pub default_ttl: Duration,
    pub prune_interval: Duration,
}

#[derive(Clone, Debug)]
pub struct MarketSettings {
    pub price_ttl: Duration,
    pub historical_ttl: Duration,
    pub overview_ttl: Duration,
}

#[derive(Clone, Debug)]
pub struct ProviderSettings {
    pub primary: ProviderKind,
    pub fallback: Option<ProviderKind>,
    pub timeout: Duration,
    pub coingecko_base_url: String,
    pub coingecko_api_key: Option<String>,
    pub binance_base_url: String,
    pub mock_seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub environment: Environment,
    pub allowed_origins: Vec<String>,
    pub cache: CacheSettings,
    pub market: MarketSettings,
    pub providers: ProviderSettings,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 8080;
    const DEFAULT_CACHE_CAPACITY: usize = 1000;
    const DEFAULT_CACHE_TTL_SECS: u64 = 60;
    const DEFAULT_PRUNE_SECS: u64 = 30;
    const DEFAULT_PRICE_TTL_SECS: u64 = 30;
    const DEFAULT_HISTORICAL_TTL_SECS: u64 = 300;
    const DEFAULT_OVERVIEW_TTL_SECS: u64 = 60;
    const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 5000;
    pub const DEFAULT_COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
    pub const DEFAULT_BINANCE_BASE_URL: &str = "https://api.binance.com";

    pub fn from_env() -> Self {
        let environment = match std::env::var("ARGENT_ENV")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };

        let fallback = match std::env::var("ARGENT_FALLBACK_PROVIDER") {
            Ok(value) if value.eq_ignore_ascii_case("none") || value.trim().is_empty() => None,
            Ok(value) => match value.parse::<ProviderKind>() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    warn!("ARGENT_FALLBACK_PROVIDER: {}, using 'binance'", e);
                    Some(ProviderKind::Binance)
                }
            },
            Err(_) => Some(ProviderKind::Binance),
        };

        Self {
            host: std::env::var("ARGENT_HOST").unwrap_or_else(|_| Self::DEFAULT_HOST.to_string()),
            http_port: env_parse("ARGENT_HTTP_PORT", Self::DEFAULT_HTTP_PORT),
            environment,
            allowed_origins: std::env::var("ARGENT_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            cache: CacheSettings {
                capacity: env_parse("ARGENT_CACHE_CAPACITY", Self::DEFAULT_CACHE_CAPACITY).max(1),
                default_ttl: secs("ARGENT_CACHE_TTL_SECS", Self::DEFAULT_CACHE_TTL_SECS),
                prune_interval: secs("ARGENT_CACHE_PRUNE_SECS", Self::DEFAULT_PRUNE_SECS),
            },
            market: MarketSettings {
                price_ttl: secs("ARGENT_PRICE_TTL_SECS", Self::DEFAULT_PRICE_TTL_SECS),
                historical_ttl: secs(
                    "ARGENT_HISTORICAL_TTL_SECS",
                    Self::DEFAULT_HISTORICAL_TTL_SECS,
                ),
                overview_ttl: secs("ARGENT_OVERVIEW_TTL_SECS", Self::DEFAULT_OVERVIEW_TTL_SECS),
            },
            providers: ProviderSettings {
                primary: env_parse("ARGENT_PRIMARY_PROVIDER", ProviderKind::CoinGecko),
                fallback,
                timeout: Duration::from_millis(nonzero_or_default(
                    "ARGENT_PROVIDER_TIMEOUT_MS",
                    env_parse("ARGENT_PROVIDER_TIMEOUT_MS", Self::DEFAULT_PROVIDER_TIMEOUT_MS),
                    Self::DEFAULT_PROVIDER_TIMEOUT_MS,
                )),
                coingecko_base_url: std::env::var("COINGECKO_BASE_URL")
                    .unwrap_or_else(|_| Self::DEFAULT_COINGECKO_BASE_URL.to_string()),
                coingecko_api_key: std::env::var("COINGECKO_API_KEY")
                    .ok()
                    .filter(|k| !k.is_empty()),
                binance_base_url: std::env::var("BINANCE_BASE_URL")
                    .unwrap_or_else(|_| Self::DEFAULT_BINANCE_BASE_URL.to_string()),
                mock_seed: std::env::var("ARGENT_MOCK_SEED")
                    .ok()
                    .and_then(|s| s.parse().ok()),
            },
        }
    }

    /// Whether 5xx responses may carry backend error detail
    pub fn expose_error_details(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

impl Default for Config {
    /// Development defaults backed entirely by the mock provider
    fn default() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            http_port: Self::DEFAULT_HTTP_PORT,
            environment: Environment::Development,
            allowed_origins: vec!["*".to_string()],
            cache: CacheSettings {
                capacity: Self::DEFAULT_CACHE_CAPACITY,
                default_ttl: Duration::from_secs(Self::DEFAULT_CACHE_TTL_SECS),
                prune_interval: Duration::from_secs(Self::DEFAULT_PRUNE_SECS),
            },
            market: MarketSettings {
                price_ttl: Duration::from_secs(Self::DEFAULT_PRICE_TTL_SECS),
                historical_ttl: Duration::from_secs(Self::DEFAULT_HISTORICAL_TTL_SECS),
                overview_ttl: Duration::from_secs(Self::DEFAULT_OVERVIEW_TTL_SECS),
            },
            providers: ProviderSettings {
                primary: ProviderKind::Mock,
                fallback: None,
                timeout: Duration::from_millis(Self::DEFAULT_PROVIDER_TIMEOUT_MS),
                coingecko_base_url: Self::DEFAULT_COINGECKO_BASE_URL.to_string(),
                coingecko_api_key: None,
                binance_base_url: Self::DEFAULT_BINANCE_BASE_URL.to_string(),
                mock_seed: Some(42),
            },
        }
    }
}

fn env_parse<T>(name: &str, default: T) -> T
where
    T: FromStr + fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Zero would make every timed call fail immediately
fn nonzero_or_default(name: &str, value: u64, default: u64) -> u64 {
    if value == 0 {
        warn!("{} must be greater than zero, using {}", name, default);
        default
    } else {
        value
    }
}

fn secs(name: &str, default: u64) -> Duration {
    Duration::from_secs(env_parse(name, default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parses_case_insensitively() {
        assert_eq!("CoinGecko".parse::<ProviderKind>(), Ok(ProviderKind::CoinGecko));
        assert_eq!(" binance ".parse::<ProviderKind>(), Ok(ProviderKind::Binance));
        assert_eq!("mock".parse::<ProviderKind>(), Ok(ProviderKind::Mock));
        assert!("kraken".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        assert_eq!(nonzero_or_default("ARGENT_PROVIDER_TIMEOUT_MS", 0, 5000), 5000);
        assert_eq!(nonzero_or_default("ARGENT_PROVIDER_TIMEOUT_MS", 250, 5000), 250);
    }

    #[test]
    fn test_default_config_is_development_with_mock_primary() {
        let config = Config::default();
        assert!(config.expose_error_details());
        assert_eq!(config.providers.primary, ProviderKind::Mock);
        assert!(config.providers.fallback.is_none());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }
}
