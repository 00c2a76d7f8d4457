pub mod advisor;
pub mod health;
pub mod market;
pub mod portfolio;
pub mod system;

pub use advisor::{classify_intent, suggest_strategy};
pub use health::health_check;
pub use market::{get_historical, get_overview, get_price, get_prices};
pub use portfolio::{
    create_portfolio, get_portfolio, get_valuation, list_portfolios, remove_holding,
    upsert_holding,
};
pub use system::{cache_stats, clear_cache, prune_cache};
