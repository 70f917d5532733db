//! Cache Module
//!
//! In-process cache between the services and the repository: a TTL + LRU
//! store, a thread-safe handle over it, the typed key namespace and the
//! invalidation coordinator.

mod entry;
mod invalidation;
mod keys;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use invalidation::{Fanout, Invalidator, Mutation};
pub use keys::CacheKey;
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default maximum number of entries
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default time-to-live in seconds (30 minutes)
pub const DEFAULT_TTL_SECS: u64 = 30 * 60;
