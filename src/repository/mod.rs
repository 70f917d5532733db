//! Persistence collaborator
//!
//! The services only need find/save/delete by id plus a few relationship
//! queries. Saving an entity whose id is `0` allocates a fresh id; an
//! explicit id is kept and never handed out again.
//!
//! `update_*` only write rows that still exist, and city writes only land
//! under an existing country, so a concurrent delete is never undone.

mod memory;

pub use memory::InMemoryRepository;

use crate::models::{City, Country, EntityId, Nation};

/// Storage for countries, cities, nations and the country↔nation links.
pub trait Repository: Send + Sync {
    // Countries
    fn find_country(&self, id: EntityId) -> Option<Country>;
    fn find_country_by_name(&self, name: &str) -> Option<Country>;
    fn list_countries(&self) -> Vec<Country>;
    /// Inserts or replaces a country.
    fn save_country(&self, country: Country) -> Country;
    /// Replaces an existing country. `None` if it no longer exists.
    fn update_country(&self, country: Country) -> Option<Country>;
    /// Deletes the country, its cities and its nation links.
    fn delete_country(&self, id: EntityId) -> bool;
    /// Deletes every country, city and link. Nations survive.
    fn delete_all_countries(&self);
    /// Countries owning at least one city whose name contains `fragment`
    /// (case-insensitive).
    fn find_countries_by_city_name(&self, fragment: &str) -> Vec<Country>;

    // Cities
    fn find_city(&self, id: EntityId) -> Option<City>;
    fn list_cities(&self) -> Vec<City>;
    fn cities_by_country(&self, country_id: EntityId) -> Vec<City>;
    /// Inserts or replaces a city. `None` if its country does not exist.
    fn save_city(&self, city: City) -> Option<City>;
    /// Saves all cities or none: `None` if any country is missing.
    fn save_cities(&self, cities: Vec<City>) -> Option<Vec<City>>;
    /// Replaces an existing city. `None` if it or its country is gone.
    fn update_city(&self, city: City) -> Option<City>;
    fn delete_city(&self, id: EntityId) -> bool;
    /// Returns the number of deleted cities.
    fn delete_cities_by_country(&self, country_id: EntityId) -> usize;

    // Nations
    fn find_nation(&self, id: EntityId) -> Option<Nation>;
    fn find_nation_by_name(&self, name: &str) -> Option<Nation>;
    fn list_nations(&self) -> Vec<Nation>;
    fn save_nation(&self, nation: Nation) -> Nation;
    /// Replaces an existing nation. `None` if it no longer exists.
    fn update_nation(&self, nation: Nation) -> Option<Nation>;
    /// Deletes the nation and unlinks it from every country.
    fn delete_nation(&self, id: EntityId) -> bool;

    // Links
    /// Returns false if the link already existed or either side is missing.
    fn link(&self, country_id: EntityId, nation_id: EntityId) -> bool;
    /// Returns false if there was no such link.
    fn unlink(&self, country_id: EntityId, nation_id: EntityId) -> bool;
    fn nations_of_country(&self, country_id: EntityId) -> Vec<Nation>;
    fn countries_of_nation(&self, nation_id: EntityId) -> Vec<Country>;

    fn nation_ids_of_country(&self, country_id: EntityId) -> Vec<EntityId> {
        self.nations_of_country(country_id)
            .into_iter()
            .map(|n| n.id)
            .collect()
    }

    fn country_ids_of_nation(&self, nation_id: EntityId) -> Vec<EntityId> {
        self.countries_of_nation(nation_id)
            .into_iter()
            .map(|c| c.id)
            .collect()
    }
}
