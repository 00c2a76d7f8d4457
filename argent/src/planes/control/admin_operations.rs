use crate::cache::TtlCache;
use crate::domain::CacheStats;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::info;

/// Operational controls exposed to the system routes
pub trait AdminOperations: Send + Sync + 'static {
    fn cache_stats(&self) -> CacheStats;
    fn clear_cache(&self);
    fn prune_cache(&self) -> usize;
}

impl<K, V> AdminOperations for TtlCache<K, V>
where
    K: Debug + Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn cache_stats(&self) -> CacheStats {
        self.stats()
    }

    fn clear_cache(&self) {
        let size = self.len();
        self.clear();
        info!("Cache cleared ({} entries dropped)", size);
    }

    fn prune_cache(&self) -> usize {
        let removed = self.prune();
        if removed > 0 {
            info!("Pruned {} expired cache entries", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_admin_operations_delegate_to_cache() {
        let clock = Arc::new(ManualClock::default());
        let cache: TtlCache<String, u32> =
            TtlCache::with_clock(4, Duration::from_secs(10), clock.clone());
        let admin: &dyn AdminOperations = &cache;

        cache.set("a".into(), 1, Some(Duration::from_secs(1)));
        cache.set("b".into(), 2, None);
        clock.advance(Duration::from_secs(2));

        assert_eq!(admin.prune_cache(), 1);
        assert_eq!(admin.cache_stats().size, 1);

        admin.clear_cache();
        assert_eq!(admin.cache_stats().size, 0);
        assert_eq!(admin.cache_stats().sets, 2);
    }
}
