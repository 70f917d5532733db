//! Cache key namespace.
//!
//! Every cached query shape has one variant here, so keys are built in one
//! place and two shapes can never collide on a hand-concatenated string.

use std::fmt;

use crate::models::EntityId;

/// A cached query result.
///
/// `Display` yields the stored string key, e.g. `countryId_1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// Full city listing
    AllCities,
    /// Cities under one country
    CitiesByCountry(EntityId),
    /// Full country listing (snapshots)
    AllCountries,
    /// One country snapshot, with nested cities and nations
    Country(EntityId),
    /// Full nation listing
    AllNations,
    /// Nations linked to one country
    NationsByCountry(EntityId),
    /// Country snapshots linked to one nation
    CountriesByNation(EntityId),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::AllCities => f.write_str("allCities"),
            CacheKey::CitiesByCountry(id) => write!(f, "allCitiesByCountryId_{}", id),
            CacheKey::AllCountries => f.write_str("allCountries"),
            CacheKey::Country(id) => write!(f, "countryId_{}", id),
            CacheKey::AllNations => f.write_str("allNations"),
            CacheKey::NationsByCountry(id) => write!(f, "allNationsByCountryId_{}", id),
            CacheKey::CountriesByNation(id) => write!(f, "allCountriesByNationId_{}", id),
        }
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.to_string()
    }
}
