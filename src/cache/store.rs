//! Cache Store Module
//!
//! Main cache engine: a HashMap of entries with TTL expiration and LRU
//! eviction. This type is single-threaded (`&mut self`); share it through
//! [`SharedCache`](crate::cache::SharedCache).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};
use crate::error::{AppError, Result};

// == Cache Store ==
/// Bounded key-value storage with per-entry TTL and LRU eviction.
///
/// Invariants:
/// - `len() <= capacity()` after every `put`. Room is made before inserting.
/// - An entry is never returned once its TTL has elapsed.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// TTL applied when `put` is called without an explicit one
    default_ttl: Duration,
    /// Monotonic access counter, orders entries touched within the same instant
    seq: u64,
    /// Bumped by every `remove` and `clear`, hit or not
    generation: u64,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with the given capacity and default TTL.
    ///
    /// # Errors
    /// Returns `AppError::InvalidConfig` when `capacity` is zero.
    pub fn new(capacity: usize, default_ttl: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(AppError::InvalidConfig(
                "cache capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            entries: HashMap::with_capacity(capacity.min(4096)),
            stats: CacheStats::new(),
            capacity,
            default_ttl,
            seq: 0,
            generation: 0,
        })
    }

    // == Put ==
    /// Stores `value` under `key` with the default TTL.
    pub fn put(&mut self, key: impl Into<String>, value: V) {
        let ttl = self.default_ttl;
        self.put_at(key.into(), value, ttl, Instant::now());
    }

    /// Stores `value` under `key`, expiring `ttl` from now.
    pub fn put_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        self.put_at(key.into(), value, ttl, Instant::now());
    }

    /// Insert path with an explicit clock.
    ///
    /// Expired entries are swept first. If the store is still full and `key`
    /// is not already present, exactly one LRU victim is evicted. Overwriting
    /// a live key never evicts an unrelated entry.
    pub(crate) fn put_at(&mut self, key: String, value: V, ttl: Duration, now: Instant) {
        self.sweep_expired(now);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }

        let seq = self.next_seq();
        self.entries.insert(key, CacheEntry::new(value, ttl, now, seq));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` on a miss. An expired entry is removed and reported as a
    /// miss. A hit refreshes the entry's last-access time, not its expiry.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.stats.record_miss();
                debug!(key, "cache miss");
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            debug!(key, "expired cache entry removed");
            return None;
        }

        let seq = self.next_seq();
        let entry = self.entries.get_mut(key)?;
        entry.touch(now, seq);
        self.stats.record_hit();
        debug!(key, "cache hit");
        Some(entry.value.clone())
    }

    // == Contains Key ==
    /// Returns true iff `key` is present and not expired.
    ///
    /// Has no side effects: an expired entry is left for `get`, `put` or the
    /// background sweep to remove, and recency is not refreshed.
    pub fn contains_key(&self, key: &str) -> bool {
        self.contains_key_at(key, Instant::now())
    }

    pub(crate) fn contains_key_at(&self, key: &str, now: Instant) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    // == Remove ==
    /// Removes an entry by key. Removing an absent key is a no-op.
    ///
    /// Returns whether an entry was actually removed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.generation += 1;
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.set_total_entries(self.entries.len());
            debug!(key, "removed cache entry");
        }
        removed
    }

    // == Clear ==
    /// Empties the store. Statistics counters are kept.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.entries.clear();
        self.stats.set_total_entries(0);
        debug!("cache cleared");
    }

    // == Generation ==
    /// Counter advanced by every `remove` and `clear`.
    ///
    /// Read it before loading a value from the source of truth and hand it
    /// to [`put_if_unchanged`](Self::put_if_unchanged); if anything was
    /// invalidated in between, the load may predate that write.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stores `value` with the default TTL only if no `remove` or `clear`
    /// happened since `generation` was read. Returns whether it was stored.
    pub fn put_if_unchanged(&mut self, key: impl Into<String>, value: V, generation: u64) -> bool {
        if self.generation != generation {
            return false;
        }
        self.put(key, value);
        true
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.sweep_expired(Instant::now())
    }

    fn sweep_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();

        if removed > 0 {
            self.stats.record_expirations(removed);
            self.stats.set_total_entries(self.entries.len());
            debug!(removed, "swept expired cache entries");
        }
        removed
    }

    // == Evict LRU ==
    /// Evicts the entry with the oldest last access. O(n) over entries.
    fn evict_lru(&mut self) -> Option<String> {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.recency())
            .map(|(key, _)| key.clone())?;

        self.entries.remove(&victim);
        self.stats.record_eviction();
        debug!(key = %victim, "evicted LRU cache entry");
        Some(victim)
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
