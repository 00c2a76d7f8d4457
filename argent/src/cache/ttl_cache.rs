use super::clock::{Clock, SystemClock};
use crate::domain::CacheStats;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const MIN_TTL: Duration = Duration::from_millis(1);

#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
}

/// Bounded key-value store with per-entry expiry.
///
/// Expired entries are dropped lazily by `get`/`has` or in bulk by `prune`.
/// When full, inserting a new key evicts the entry with the oldest
/// `created_at`, regardless of how close it is to expiring.
pub struct TtlCache<K, V>
where
    K: Debug + Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    capacity: usize,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl<K, V> TtlCache<K, V>
where
    K: Debug + Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self::with_clock(capacity, default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::with_capacity(capacity.min(4096))),
            capacity: capacity.max(1),
            default_ttl: default_ttl.max(MIN_TTL),
            clock,
            counters: Counters::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // A panic while holding the lock cannot leave the map half-updated, so
    // a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or overwrite `key`. Falls back to the default TTL when `ttl` is None.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl).max(MIN_TTL);
        let created_at = self.clock.now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut entries = self.lock();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Evicted oldest cache entry {:?}", oldest);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                created_at,
                expires_at,
            },
        );
        drop(entries);

        self.counters.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_with(key, |value| Some(value.clone()))
    }

    /// Look up `key` and convert the live value with `convert`.
    ///
    /// A value that `convert` rejects is removed and counted as a miss.
    pub fn get_with<T, F>(&self, key: &K, convert: F) -> Option<T>
    where
        F: FnOnce(&V) -> Option<T>,
    {
        let now = self.clock.now();
        let mut entries = self.lock();

        let value = match entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                let converted = convert(&entry.value);
                if converted.is_none() {
                    entries.remove(key);
                }
                converted
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };
        drop(entries);

        let counter = if value.is_some() {
            &self.counters.hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    pub fn has(&self, key: &K) -> bool {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => true,
            Some(_) => {
                entries.remove(key);
                false
            }
            None => false,
        }
    }

    pub fn del(&self, key: &K) -> bool {
        let removed = self.lock().remove(key).is_some();
        if removed {
            self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn prune(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of entries that have not expired
    pub fn keys(&self) -> Vec<K> {
        let now = self.clock.now();
        self.lock()
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        CacheStats {
            hits,
            misses,
            sets: self.counters.sets.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            size: self.len(),
            capacity: self.capacity,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
        }
    }
}

impl<K, V> Debug for TtlCache<K, V>
where
    K: Debug + Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("size", &self.len())
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
