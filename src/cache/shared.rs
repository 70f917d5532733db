//! Shared Cache Module
//!
//! Thread-safe handle over [`CacheStore`]. One mutex guards the map and all
//! entry metadata, so every operation (including the read-then-touch inside
//! `get` and the sweep/evict/insert inside `put`) is atomic.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::info;

use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::error::Result;

// == Shared Cache ==
/// Concurrent cache handle shared by every request handler.
///
/// Lock hold times are O(1) for `get`, `remove` and `contains_key`, and O(n)
/// in the worst case for `put` (expiry sweep plus LRU scan), bounded by
/// capacity. No operation awaits while holding the lock.
#[derive(Debug)]
pub struct SharedCache<V> {
    inner: Mutex<CacheStore<V>>,
}

impl<V: Clone> SharedCache<V> {
    /// Creates a cache with the given capacity and default TTL.
    ///
    /// # Errors
    /// Fails only when `capacity` is zero.
    pub fn new(capacity: usize, default_ttl: Duration) -> Result<Self> {
        let store = CacheStore::new(capacity, default_ttl)?;
        info!(
            capacity,
            default_ttl_secs = default_ttl.as_secs(),
            "Cache initialized"
        );
        Ok(Self {
            inner: Mutex::new(store),
        })
    }

    /// Creates a cache sized from the application configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.cache_capacity, config.default_ttl())
    }

    // A panic while holding the lock cannot leave the map half-updated in a
    // way that breaks the size or expiry invariants, so keep serving.
    fn lock(&self) -> MutexGuard<'_, CacheStore<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `value` under `key` with the default TTL.
    pub fn put(&self, key: impl Into<String>, value: V) {
        self.lock().put(key, value);
    }

    /// Stores `value` under `key` with an explicit TTL.
    pub fn put_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.lock().put_with_ttl(key, value, ttl);
    }

    /// Returns the cached value, or `None` on a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key)
    }

    /// True iff `key` is present and unexpired. Never mutates the store.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Removes `key` if present. Returns whether anything was removed.
    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// See [`CacheStore::generation`].
    pub fn generation(&self) -> u64 {
        self.lock().generation()
    }

    /// Stores `value` unless something was removed or cleared since
    /// `generation` was read. The check and the insert share one lock.
    pub fn put_if_unchanged(&self, key: impl Into<String>, value: V, generation: u64) -> bool {
        self.lock().put_if_unchanged(key, value, generation)
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        self.lock().cleanup_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_shared_cache_basic_operations() {
        let cache = SharedCache::new(10, Duration::from_secs(60)).unwrap();

        cache.put("a", 1);
        assert!(cache.contains_key("a"));
        assert_eq!(cache.get("a"), Some(1));

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_shared_cache_from_config() {
        let config = Config {
            cache_capacity: 7,
            ..Config::default()
        };
        let cache = SharedCache::<u32>::from_config(&config).unwrap();
        assert_eq!(cache.capacity(), 7);
    }

    #[test]
    fn test_shared_cache_rejects_zero_capacity() {
        assert!(SharedCache::<u32>::new(0, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_put_if_unchanged_loses_to_concurrent_remove() {
        let cache = Arc::new(SharedCache::new(10, Duration::from_secs(60)).unwrap());
        let generation = cache.generation();

        let writer = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.remove("view"))
        };
        writer.join().expect("writer thread panicked");

        assert!(!cache.put_if_unchanged("view", 1, generation));
        assert!(!cache.contains_key("view"));
        assert!(cache.put_if_unchanged("view", 2, cache.generation()));
        assert_eq!(cache.get("view"), Some(2));
    }

    #[test]
    fn test_concurrent_puts_respect_capacity() {
        let cache = Arc::new(SharedCache::new(16, Duration::from_secs(60)).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..200 {
                        cache.put(format!("t{}_k{}", t, i), i);
                        let _ = cache.get(&format!("t{}_k{}", t, i / 2));
                        assert!(cache.len() <= 16);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("worker thread panicked");
        }

        assert!(cache.len() <= 16);
        let stats = cache.stats();
        assert_eq!(stats.total_entries, cache.len());
        assert!(stats.evictions > 0);
    }

    #[test]
    fn test_concurrent_readers_see_complete_values() {
        let cache = Arc::new(SharedCache::new(4, Duration::from_secs(60)).unwrap());
        cache.put("shared", vec![1u8; 64]);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..500 {
                        if t == 0 {
                            cache.put("shared", vec![2u8; 64]);
                        }
                        if let Some(value) = cache.get("shared") {
                            assert_eq!(value.len(), 64);
                            assert!(value.iter().all(|b| *b == value[0]));
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("worker thread panicked");
        }
    }
}
