pub mod clock;
pub mod ttl_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl_cache::{CacheEntry, TtlCache};

/// Cache shared by every market-data lookup; values are stored as JSON so
/// one instance can hold quotes, candles and overviews side by side.
pub type MarketCache = TtlCache<String, serde_json::Value>;
