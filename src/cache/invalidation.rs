//! Invalidation coordinator.
//!
//! Maps each kind of entity mutation to the set of cache keys whose cached
//! value may now be stale, and removes them. Read views embed one hop of
//! relationships:
//!
//! - a country snapshot (`countryId_{id}`) carries the country's cities and nations
//! - `allCountries` and `allCountriesByNationId_{id}` are lists of snapshots
//! - city listings carry the owning country id
//! - nation listings are plain
//!
//! so a mutation removes every key built from the mutated entity or from an
//! entity one hop away. Removal is push-based and synchronous; the rules err
//! toward removing too much, never too little.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheKey, SharedCache};
use crate::models::EntityId;

// == Mutation ==
/// A committed change to the entity graph.
///
/// Relationship ids must be those linked *before* the change for deletions
/// and unlinks, and after it for additions; passing the union is always safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A city was created, updated or deleted under `country_id`. A bulk
    /// operation on one country's cities is reported once.
    CityChanged {
        country_id: EntityId,
        nation_ids: Vec<EntityId>,
    },
    /// A country was created. No per-id key can exist for it yet.
    CountryCreated,
    /// A country's fields were edited in place (identity is immutable).
    CountryUpdated {
        country_id: EntityId,
        nation_ids: Vec<EntityId>,
    },
    /// A country was deleted together with its cities and nation links.
    CountryDeleted {
        country_id: EntityId,
        nation_ids: Vec<EntityId>,
    },
    /// A nation was created, updated or deleted, or linked to / unlinked
    /// from a country. `country_ids` lists every country linked before or
    /// after the change.
    NationChanged {
        nation_id: EntityId,
        country_ids: Vec<EntityId>,
    },
    /// Every country (and hence every city and link) was deleted.
    AllCountriesDeleted,
}

/// Keys a mutation invalidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fanout {
    Keys(BTreeSet<CacheKey>),
    Everything,
}

impl Mutation {
    /// Computes the fan-out for this mutation without touching any cache.
    pub fn fanout(&self) -> Fanout {
        let mut keys = BTreeSet::new();

        match self {
            Mutation::CityChanged {
                country_id,
                nation_ids,
            } => {
                keys.insert(CacheKey::AllCities);
                keys.insert(CacheKey::CitiesByCountry(*country_id));
                keys.insert(CacheKey::Country(*country_id));
                // Snapshot lists embed the country's cities
                keys.insert(CacheKey::AllCountries);
                keys.extend(nation_ids.iter().map(|id| CacheKey::CountriesByNation(*id)));
            }
            Mutation::CountryCreated => {
                keys.insert(CacheKey::AllCountries);
            }
            Mutation::CountryUpdated {
                country_id,
                nation_ids,
            } => {
                keys.insert(CacheKey::AllCountries);
                keys.insert(CacheKey::Country(*country_id));
                keys.extend(nation_ids.iter().map(|id| CacheKey::CountriesByNation(*id)));
            }
            Mutation::CountryDeleted {
                country_id,
                nation_ids,
            } => {
                keys.insert(CacheKey::AllCountries);
                keys.insert(CacheKey::Country(*country_id));
                keys.insert(CacheKey::CitiesByCountry(*country_id));
                keys.insert(CacheKey::NationsByCountry(*country_id));
                // The country's cities are deleted with it
                keys.insert(CacheKey::AllCities);
                keys.extend(nation_ids.iter().map(|id| CacheKey::CountriesByNation(*id)));
            }
            Mutation::NationChanged {
                nation_id,
                country_ids,
            } => {
                keys.insert(CacheKey::AllNations);
                keys.insert(CacheKey::CountriesByNation(*nation_id));
                keys.insert(CacheKey::AllCountries);
                for id in country_ids {
                    keys.insert(CacheKey::NationsByCountry(*id));
                    keys.insert(CacheKey::Country(*id));
                }
            }
            Mutation::AllCountriesDeleted => return Fanout::Everything,
        }

        Fanout::Keys(keys)
    }
}

// == Invalidator ==
/// Applies mutation fan-outs to a shared cache.
///
/// Never fails: removing an absent key is a no-op.
#[derive(Debug)]
pub struct Invalidator<V> {
    cache: Arc<SharedCache<V>>,
}

impl<V> Clone for Invalidator<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<V: Clone> Invalidator<V> {
    pub fn new(cache: Arc<SharedCache<V>>) -> Self {
        Self { cache }
    }

    /// Removes every key affected by `mutation`.
    ///
    /// Returns the number of entries that were actually present and removed.
    pub fn apply(&self, mutation: &Mutation) -> usize {
        match mutation.fanout() {
            Fanout::Everything => {
                let removed = self.cache.len();
                self.cache.clear();
                debug!(?mutation, removed, "cache cleared");
                removed
            }
            Fanout::Keys(keys) => {
                let removed = keys
                    .iter()
                    .filter(|key| self.cache.remove(&key.to_string()))
                    .count();
                debug!(?mutation, ?keys, removed, "cache keys invalidated");
                removed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn keys(mutation: Mutation) -> BTreeSet<CacheKey> {
        match mutation.fanout() {
            Fanout::Keys(keys) => keys,
            Fanout::Everything => panic!("expected a key fan-out"),
        }
    }

    fn cache_with(keys: &[CacheKey]) -> Arc<SharedCache<u32>> {
        let cache = Arc::new(SharedCache::new(100, Duration::from_secs(60)).unwrap());
        for key in keys {
            cache.put(*key, 0);
        }
        cache
    }

    #[test]
    fn test_city_change_fanout() {
        let keys = keys(Mutation::CityChanged {
            country_id: 1,
            nation_ids: vec![5, 6],
        });

        for expected in [
            CacheKey::AllCities,
            CacheKey::CitiesByCountry(1),
            CacheKey::Country(1),
            CacheKey::AllCountries,
            CacheKey::CountriesByNation(5),
            CacheKey::CountriesByNation(6),
        ] {
            assert!(keys.contains(&expected), "missing {}", expected);
        }
        assert!(!keys.contains(&CacheKey::AllNations));
        assert!(!keys.contains(&CacheKey::NationsByCountry(1)));
    }

    #[test]
    fn test_country_created_fanout() {
        let keys = keys(Mutation::CountryCreated);
        assert_eq!(keys, BTreeSet::from([CacheKey::AllCountries]));
    }

    #[test]
    fn test_country_updated_fanout() {
        let keys = keys(Mutation::CountryUpdated {
            country_id: 2,
            nation_ids: vec![7],
        });
        assert_eq!(
            keys,
            BTreeSet::from([
                CacheKey::AllCountries,
                CacheKey::Country(2),
                CacheKey::CountriesByNation(7),
            ])
        );
    }

    #[test]
    fn test_country_deleted_fanout() {
        let keys = keys(Mutation::CountryDeleted {
            country_id: 3,
            nation_ids: vec![8, 9],
        });

        for expected in [
            CacheKey::AllCountries,
            CacheKey::Country(3),
            CacheKey::CitiesByCountry(3),
            CacheKey::NationsByCountry(3),
            CacheKey::AllCities,
            CacheKey::CountriesByNation(8),
            CacheKey::CountriesByNation(9),
        ] {
            assert!(keys.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_nation_changed_fanout() {
        let keys = keys(Mutation::NationChanged {
            nation_id: 5,
            country_ids: vec![1, 2],
        });

        for expected in [
            CacheKey::AllNations,
            CacheKey::CountriesByNation(5),
            CacheKey::NationsByCountry(1),
            CacheKey::NationsByCountry(2),
            CacheKey::Country(1),
            CacheKey::Country(2),
        ] {
            assert!(keys.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_all_countries_deleted_clears_everything() {
        assert_eq!(Mutation::AllCountriesDeleted.fanout(), Fanout::Everything);

        let cache = cache_with(&[CacheKey::AllNations, CacheKey::Country(1)]);
        let invalidator = Invalidator::new(Arc::clone(&cache));

        assert_eq!(invalidator.apply(&Mutation::AllCountriesDeleted), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_apply_removes_only_affected_keys() {
        let cache = cache_with(&[
            CacheKey::AllCountries,
            CacheKey::Country(1),
            CacheKey::CitiesByCountry(1),
            CacheKey::Country(2),
            CacheKey::AllNations,
        ]);
        let invalidator = Invalidator::new(Arc::clone(&cache));

        let removed = invalidator.apply(&Mutation::CityChanged {
            country_id: 1,
            nation_ids: vec![],
        });

        assert_eq!(removed, 3);
        assert!(!cache.contains_key("allCountries"));
        assert!(!cache.contains_key("countryId_1"));
        assert!(!cache.contains_key("allCitiesByCountryId_1"));
        assert!(cache.contains_key("countryId_2"));
        assert!(cache.contains_key("allNations"));
    }

    #[test]
    fn test_apply_on_empty_cache_is_noop() {
        let cache = cache_with(&[]);
        let invalidator = Invalidator::new(Arc::clone(&cache));

        let mutation = Mutation::NationChanged {
            nation_id: 1,
            country_ids: vec![1],
        };
        assert_eq!(invalidator.apply(&mutation), 0);
        assert_eq!(invalidator.apply(&mutation), 0);
    }
}
