//! Cache Entry Module
//!
//! Defines the record the store keeps per key: the value plus its expiry and
//! access metadata.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A cached value with an absolute expiry and a sliding last-access time.
///
/// `expires_at` is fixed when the entry is created and never refreshed by
/// reads. Only `last_accessed_at` slides, and only victim selection uses it.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant after which the entry is no longer served
    pub expires_at: Instant,
    /// Instant of the last successful read (or of insertion)
    pub last_accessed_at: Instant,
    /// Store-wide access sequence number, breaks ties between equal instants
    pub access_seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` after `now`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Time-to-live measured from `now`
    /// * `now` - Insertion instant
    /// * `seq` - Access sequence number assigned by the store
    pub fn new(value: V, ttl: Duration, now: Instant, seq: u64) -> Self {
        // Saturate instead of panicking on absurd TTLs
        let expires_at = now.checked_add(ttl).unwrap_or_else(|| far_future(now));

        Self {
            value,
            expires_at,
            last_accessed_at: now,
            access_seq: seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now >= expires_at`, so a read made exactly
    /// `ttl` after insertion is already a miss.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Checks if the entry has expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self, now: Instant, seq: u64) {
        self.last_accessed_at = now;
        self.access_seq = seq;
    }

    // == Recency Rank ==
    /// Ordering key for LRU victim selection: smaller means less recently used.
    pub fn recency(&self) -> (Instant, u64) {
        (self.last_accessed_at, self.access_seq)
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Largest instant we can represent relative to `now` (roughly a century out).
fn far_future(now: Instant) -> Instant {
    const CENTURY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);
    now.checked_add(CENTURY).unwrap_or(now)
}
