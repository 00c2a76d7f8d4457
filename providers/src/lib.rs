//! Market-data backends implementing `argent::ports::MarketDataProvider`.

pub mod binance;
pub mod coingecko;
mod http;
pub mod mock;
pub mod registry;
pub mod symbols;

pub use binance::BinanceProvider;
pub use coingecko::CoinGeckoProvider;
pub use mock::MockProvider;
pub use registry::ProviderRegistry;
