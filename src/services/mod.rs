//! Service layer
//!
//! Reads go through the cache (cache-aside); every successful mutation is
//! followed by an invalidation fan-out before the call returns.

mod city;
mod country;
mod nation;

pub use city::CityService;
pub use country::CountryService;
pub use nation::NationService;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::cache::{CacheKey, Invalidator, Mutation, SharedCache};
use crate::error::{AppError, Result};
use crate::metrics::AccessCounter;
use crate::models::{CachedView, Country, CountryView, EntityId};
use crate::repository::Repository;

/// Cache of composed query results.
pub type ViewCache = SharedCache<CachedView>;

/// Collaborators shared by all services.
#[derive(Clone)]
pub struct ServiceContext {
    pub repo: Arc<dyn Repository>,
    pub cache: Arc<ViewCache>,
    pub invalidator: Invalidator<CachedView>,
    pub access_counter: Arc<AccessCounter>,
    /// Serializes mutations so check, write and invalidation form one unit.
    write_lock: Arc<Mutex<()>>,
}

impl ServiceContext {
    pub fn new(
        repo: Arc<dyn Repository>,
        cache: Arc<ViewCache>,
        access_counter: Arc<AccessCounter>,
    ) -> Self {
        Self {
            invalidator: Invalidator::new(Arc::clone(&cache)),
            repo,
            cache,
            access_counter,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Held by every mutating service call from its first check until its
    /// invalidation has been applied. Not reentrant.
    pub(crate) fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serves `key` from the cache, or loads, caches and returns it.
    ///
    /// `unwrap` checks the cached variant; an entry of the wrong shape is
    /// dropped and treated as a miss. Load errors are returned uncached.
    ///
    /// A loaded value is only cached if nothing was invalidated while it was
    /// being loaded; otherwise the next read loads again.
    pub(crate) fn cache_aside<T: Clone>(
        &self,
        key: CacheKey,
        unwrap: fn(CachedView) -> Option<T>,
        wrap: fn(T) -> CachedView,
        load: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        self.access_counter.increment();
        let cache_key = key.to_string();

        if let Some(view) = self.cache.get(&cache_key) {
            match unwrap(view) {
                Some(value) => {
                    debug!(key = %cache_key, "served from cache");
                    return Ok(value);
                }
                None => {
                    warn!(key = %cache_key, "Invalid cache entry, dropping");
                    self.cache.remove(&cache_key);
                }
            }
        }

        let generation = self.cache.generation();
        let value = load()?;
        if self.cache.put_if_unchanged(cache_key, wrap(value.clone()), generation) {
            debug!(key = %key, "loaded from repository and cached");
        } else {
            debug!(key = %key, "invalidated during load, not cached");
        }
        Ok(value)
    }

    pub(crate) fn invalidate(&self, mutation: Mutation) {
        self.invalidator.apply(&mutation);
    }

    /// Builds a country snapshot with cities and nations resolved.
    pub(crate) fn country_view(&self, country: Country) -> CountryView {
        let cities = self.repo.cities_by_country(country.id);
        let nations = self.repo.nations_of_country(country.id);
        CountryView {
            country,
            cities,
            nations,
        }
    }

    pub(crate) fn require_country(&self, id: EntityId) -> Result<Country> {
        self.repo
            .find_country(id)
            .ok_or_else(|| AppError::NotFound(format!("Country {} not found", id)))
    }
}

/// Rejects payloads whose `validate()` produced a message.
pub(crate) fn ensure_valid(message: Option<String>) -> Result<()> {
    match message {
        Some(msg) => Err(AppError::InvalidRequest(msg)),
        None => Ok(()),
    }
}
