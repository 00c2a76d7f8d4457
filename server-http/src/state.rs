use argent::advisor::{IntentClassifier, StrategyAdvisor};
use argent::cache::MarketCache;
use argent::planes::control::AdminOperations;
use argent::planes::data::portfolio::PortfolioService;
use argent::planes::data::{MarketService, ProviderResolver};
use argent::ports::SharedProvider;
use chrono::{DateTime, Utc};
use market_providers::ProviderRegistry;
use shared::config::Config;
use std::sync::Arc;
use tracing::info;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<MarketCache>,
    pub admin: Arc<dyn AdminOperations>,
    pub market: Arc<MarketService>,
    pub portfolios: Arc<PortfolioService>,
    pub advisor: Arc<StrategyAdvisor>,
    pub classifier: IntentClassifier,
    pub config: Arc<Config>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire the services around an explicit pair of providers
    pub fn new(config: Config, primary: SharedProvider, fallback: Option<SharedProvider>) -> Self {
        let cache = Arc::new(MarketCache::new(
            config.cache.capacity,
            config.cache.default_ttl,
        ));
        info!(
            "Market cache initialized (capacity {}, default TTL {:?})",
            config.cache.capacity, config.cache.default_ttl
        );

        let resolver = ProviderResolver::new(cache.clone(), config.providers.timeout);
        let market = Arc::new(MarketService::new(
            resolver,
            primary,
            fallback,
            config.market.clone(),
        ));
        let portfolios = Arc::new(PortfolioService::with_demo_portfolio(market.clone()));
        let advisor = Arc::new(StrategyAdvisor::new(market.clone()));

        Self {
            admin: cache.clone(),
            cache,
            market,
            portfolios,
            advisor,
            classifier: IntentClassifier::new(),
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }

    /// Build providers from configuration through the registry
    pub fn from_config(config: Config) -> shared::Result<Self> {
        let registry = ProviderRegistry::new(config.providers.clone())?;
        let primary = registry.primary();
        let fallback = registry.fallback();
        Ok(Self::new(config, primary, fallback))
    }
}
