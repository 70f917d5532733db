//! In-memory repository backed by ordered maps behind one RwLock.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{City, Country, EntityId, Nation};
use crate::repository::Repository;

#[derive(Debug, Default)]
struct Tables {
    countries: BTreeMap<EntityId, Country>,
    cities: BTreeMap<EntityId, City>,
    nations: BTreeMap<EntityId, Nation>,
    /// (country_id, nation_id)
    links: BTreeSet<(EntityId, EntityId)>,
    next_id: EntityId,
}

impl Tables {
    /// Keeps an explicit id, or allocates one for id `0`.
    fn assign_id(&mut self, id: EntityId) -> EntityId {
        if id == 0 {
            self.next_id += 1;
            self.next_id
        } else {
            self.next_id = self.next_id.max(id);
            id
        }
    }

    fn insert_city(&mut self, mut city: City) -> City {
        city.id = self.assign_id(city.id);
        self.cities.insert(city.id, city.clone());
        city
    }
}

/// Thread-safe in-memory [`Repository`]. Iteration order is by id.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Repository for InMemoryRepository {
    fn find_country(&self, id: EntityId) -> Option<Country> {
        self.read().countries.get(&id).cloned()
    }

    fn find_country_by_name(&self, name: &str) -> Option<Country> {
        self.read()
            .countries
            .values()
            .find(|c| c.name == name)
            .cloned()
    }

    fn list_countries(&self) -> Vec<Country> {
        self.read().countries.values().cloned().collect()
    }

    fn save_country(&self, mut country: Country) -> Country {
        let mut tables = self.write();
        country.id = tables.assign_id(country.id);
        tables.countries.insert(country.id, country.clone());
        country
    }

    fn update_country(&self, country: Country) -> Option<Country> {
        let mut tables = self.write();
        let slot = tables.countries.get_mut(&country.id)?;
        *slot = country.clone();
        Some(country)
    }

    fn delete_country(&self, id: EntityId) -> bool {
        let mut tables = self.write();
        if tables.countries.remove(&id).is_none() {
            return false;
        }
        tables.cities.retain(|_, city| city.country_id != id);
        tables.links.retain(|(country_id, _)| *country_id != id);
        true
    }

    fn delete_all_countries(&self) {
        let mut tables = self.write();
        tables.countries.clear();
        tables.cities.clear();
        tables.links.clear();
    }

    fn find_countries_by_city_name(&self, fragment: &str) -> Vec<Country> {
        let needle = fragment.to_lowercase();
        let tables = self.read();
        let owners: BTreeSet<EntityId> = tables
            .cities
            .values()
            .filter(|city| city.name.to_lowercase().contains(&needle))
            .map(|city| city.country_id)
            .collect();

        owners
            .iter()
            .filter_map(|id| tables.countries.get(id).cloned())
            .collect()
    }

    fn find_city(&self, id: EntityId) -> Option<City> {
        self.read().cities.get(&id).cloned()
    }

    fn list_cities(&self) -> Vec<City> {
        self.read().cities.values().cloned().collect()
    }

    fn cities_by_country(&self, country_id: EntityId) -> Vec<City> {
        self.read()
            .cities
            .values()
            .filter(|city| city.country_id == country_id)
            .cloned()
            .collect()
    }

    fn save_city(&self, city: City) -> Option<City> {
        let mut tables = self.write();
        if !tables.countries.contains_key(&city.country_id) {
            return None;
        }
        Some(tables.insert_city(city))
    }

    fn save_cities(&self, cities: Vec<City>) -> Option<Vec<City>> {
        let mut tables = self.write();
        if cities
            .iter()
            .any(|city| !tables.countries.contains_key(&city.country_id))
        {
            return None;
        }
        Some(
            cities
                .into_iter()
                .map(|city| tables.insert_city(city))
                .collect(),
        )
    }

    fn update_city(&self, city: City) -> Option<City> {
        let mut tables = self.write();
        if !tables.countries.contains_key(&city.country_id) {
            return None;
        }
        let slot = tables.cities.get_mut(&city.id)?;
        *slot = city.clone();
        Some(city)
    }

    fn delete_city(&self, id: EntityId) -> bool {
        self.write().cities.remove(&id).is_some()
    }

    fn delete_cities_by_country(&self, country_id: EntityId) -> usize {
        let mut tables = self.write();
        let before = tables.cities.len();
        tables.cities.retain(|_, city| city.country_id != country_id);
        before - tables.cities.len()
    }

    fn find_nation(&self, id: EntityId) -> Option<Nation> {
        self.read().nations.get(&id).cloned()
    }

    fn find_nation_by_name(&self, name: &str) -> Option<Nation> {
        self.read()
            .nations
            .values()
            .find(|n| n.name == name)
            .cloned()
    }

    fn list_nations(&self) -> Vec<Nation> {
        self.read().nations.values().cloned().collect()
    }

    fn save_nation(&self, mut nation: Nation) -> Nation {
        let mut tables = self.write();
        nation.id = tables.assign_id(nation.id);
        tables.nations.insert(nation.id, nation.clone());
        nation
    }

    fn update_nation(&self, nation: Nation) -> Option<Nation> {
        let mut tables = self.write();
        let slot = tables.nations.get_mut(&nation.id)?;
        *slot = nation.clone();
        Some(nation)
    }

    fn delete_nation(&self, id: EntityId) -> bool {
        let mut tables = self.write();
        if tables.nations.remove(&id).is_none() {
            return false;
        }
        tables.links.retain(|(_, nation_id)| *nation_id != id);
        true
    }

    fn link(&self, country_id: EntityId, nation_id: EntityId) -> bool {
        let mut tables = self.write();
        if !tables.countries.contains_key(&country_id) || !tables.nations.contains_key(&nation_id)
        {
            return false;
        }
        tables.links.insert((country_id, nation_id))
    }

    fn unlink(&self, country_id: EntityId, nation_id: EntityId) -> bool {
        self.write().links.remove(&(country_id, nation_id))
    }

    fn nations_of_country(&self, country_id: EntityId) -> Vec<Nation> {
        let tables = self.read();
        tables
            .links
            .range((country_id, EntityId::MIN)..=(country_id, EntityId::MAX))
            .filter_map(|(_, nation_id)| tables.nations.get(nation_id).cloned())
            .collect()
    }

    fn countries_of_nation(&self, nation_id: EntityId) -> Vec<Country> {
        let tables = self.read();
        tables
            .links
            .iter()
            .filter(|(_, n)| *n == nation_id)
            .filter_map(|(country_id, _)| tables.countries.get(country_id).cloned())
            .collect()
    }
}
