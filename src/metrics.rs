//! Request Metrics Module
//!
//! Explicit counters handed to the services and the router instead of
//! process-wide statics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

// == Access Counter ==
/// Monotonically increasing count of logical read accesses.
///
/// Safe under concurrent increment; never decreases.
#[derive(Debug, Default)]
pub struct AccessCounter {
    count: AtomicU64,
}

impl AccessCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one access and returns the new total.
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

// == Visit Counter ==
/// Request counts keyed by route template. Callers pass matched routes,
/// never raw request paths.
#[derive(Debug, Default)]
pub struct VisitCounter {
    visits: Mutex<HashMap<String, u64>>,
}

impl VisitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a visit to `path`.
    pub fn record(&self, path: &str) {
        let mut visits = self.visits.lock().unwrap_or_else(PoisonError::into_inner);
        *visits.entry(path.to_string()).or_insert(0) += 1;
    }

    /// Number of recorded visits to `path`; zero if never visited.
    pub fn count(&self, path: &str) -> u64 {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}
