pub mod market;
pub mod portfolio;
pub mod resolver;

pub use market::MarketService;
pub use portfolio::PortfolioService;
pub use resolver::ProviderResolver;
