use crate::{BinanceProvider, CoinGeckoProvider, MockProvider};
use argent::ports::SharedProvider;
use reqwest::Client;
use shared::config::{ProviderKind, ProviderSettings};
use shared::{Error, Result};
use std::sync::Arc;
use tracing::info;

const USER_AGENT: &str = concat!("argent/", env!("CARGO_PKG_VERSION"));

/// Builds configured providers over a single shared HTTP client
#[derive(Clone, Debug)]
pub struct ProviderRegistry {
    client: Client,
    settings: ProviderSettings,
}

impl ProviderRegistry {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, settings })
    }

    pub fn build(&self, kind: ProviderKind) -> SharedProvider {
        let settings = &self.settings;
        match kind {
            ProviderKind::CoinGecko => Arc::new(
                CoinGeckoProvider::new(
                    self.client.clone(),
                    settings.coingecko_base_url.clone(),
                    settings.timeout,
                )
                .with_api_key(settings.coingecko_api_key.clone()),
            ),
            ProviderKind::Binance => Arc::new(BinanceProvider::new(
                self.client.clone(),
                settings.binance_base_url.clone(),
                settings.timeout,
            )),
            ProviderKind::Mock => Arc::new(MockProvider::new(settings.mock_seed)),
        }
    }

    pub fn primary(&self) -> SharedProvider {
        let provider = self.build(self.settings.primary);
        info!("Primary market data provider: {}", provider.name());
        provider
    }

    /// `None` when no fallback is configured or it would duplicate the primary
    pub fn fallback(&self) -> Option<SharedProvider> {
        let kind = self.settings.fallback.filter(|k| *k != self.settings.primary)?;
        let provider = self.build(kind);
        info!("Fallback market data provider: {}", provider.name());
        Some(provider)
    }
}
