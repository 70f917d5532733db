//! City operations.

use std::collections::HashSet;

use tracing::info;

use crate::cache::{CacheKey, Mutation};
use crate::error::{AppError, Result};
use crate::models::{CachedView, City, CityPatch, EntityId, NewCity};
use crate::services::{ensure_valid, ServiceContext};

#[derive(Clone)]
pub struct CityService {
    ctx: ServiceContext,
}

impl CityService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// All cities (cached under `allCities`).
    pub fn list_cities(&self) -> Result<Vec<City>> {
        self.ctx.cache_aside(
            CacheKey::AllCities,
            CachedView::into_cities,
            CachedView::Cities,
            || Ok(self.ctx.repo.list_cities()),
        )
    }

    /// Cities of one country (cached under `allCitiesByCountryId_{id}`).
    pub fn cities_by_country(&self, country_id: EntityId) -> Result<Vec<City>> {
        self.ctx.cache_aside(
            CacheKey::CitiesByCountry(country_id),
            CachedView::into_cities,
            CachedView::Cities,
            || {
                self.ctx.require_country(country_id)?;
                Ok(self.ctx.repo.cities_by_country(country_id))
            },
        )
    }

    /// Adds one city to a country. City names are unique within a country.
    pub fn add_city(&self, country_id: EntityId, request: NewCity) -> Result<City> {
        let mut added = self.add_cities(country_id, vec![request])?;
        added
            .pop()
            .ok_or_else(|| AppError::InvalidRequest("No city to add".to_string()))
    }

    /// Adds several cities to a country, all or nothing. Invalidates once.
    pub fn add_cities(&self, country_id: EntityId, requests: Vec<NewCity>) -> Result<Vec<City>> {
        for request in &requests {
            ensure_valid(request.validate())?;
        }
        let _guard = self.ctx.write_guard();
        let country = self.ctx.require_country(country_id)?;

        let mut taken: HashSet<String> = self
            .ctx
            .repo
            .cities_by_country(country_id)
            .into_iter()
            .map(|c| c.name)
            .collect();
        for request in &requests {
            if !taken.insert(request.name.clone()) {
                return Err(AppError::Conflict(format!(
                    "City with name {} already exists",
                    request.name
                )));
            }
        }

        let cities = requests
            .into_iter()
            .map(|request| City {
                id: 0,
                name: request.name,
                population: request.population,
                area_square_km: request.area_square_km,
                country_id,
            })
            .collect();
        let added = self
            .ctx
            .repo
            .save_cities(cities)
            .ok_or_else(|| country_gone(country_id))?;

        if !added.is_empty() {
            self.invalidate_for(country_id);
        }
        info!(
            count = added.len(),
            country = %country.name,
            country_id,
            "Added cities"
        );
        Ok(added)
    }

    /// Updates a city in place. Renaming checks for case-insensitive
    /// collisions with the other cities of the same country; non-positive
    /// population or area values are ignored.
    pub fn update_city(&self, city_id: EntityId, patch: CityPatch) -> Result<City> {
        ensure_valid(patch.validate())?;
        let _guard = self.ctx.write_guard();
        let mut city = self
            .ctx
            .repo
            .find_city(city_id)
            .ok_or_else(|| AppError::NotFound(format!("City {} not found", city_id)))?;
        let old_name = city.name.clone();

        if let Some(name) = patch.name.filter(|n| *n != city.name) {
            let clash = self
                .ctx
                .repo
                .cities_by_country(city.country_id)
                .iter()
                .any(|c| c.id != city_id && c.name.eq_ignore_ascii_case(&name));
            if clash {
                return Err(AppError::Conflict("City name already exists".to_string()));
            }
            city.name = name;
        }
        if let Some(population) = patch.population.filter(|p| *p > 0.0) {
            city.population = Some(population);
        }
        if let Some(area) = patch.area_square_km.filter(|a| *a > 0.0) {
            city.area_square_km = Some(area);
        }

        let city = self
            .ctx
            .repo
            .update_city(city)
            .ok_or_else(|| AppError::NotFound(format!("City {} not found", city_id)))?;
        self.invalidate_for(city.country_id);
        info!(city_id, %old_name, new_name = %city.name, "Updated city");
        Ok(city)
    }

    /// Deletes one city, which must belong to `country_id`.
    pub fn delete_city(&self, country_id: EntityId, city_id: EntityId) -> Result<()> {
        let _guard = self.ctx.write_guard();
        self.ctx.require_country(country_id)?;
        let city = self
            .ctx
            .repo
            .find_city(city_id)
            .filter(|c| c.country_id == country_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "City {} not found in country {}",
                    city_id, country_id
                ))
            })?;

        self.ctx.repo.delete_city(city_id);
        self.invalidate_for(country_id);
        info!(city_id, name = %city.name, "Deleted city");
        Ok(())
    }

    /// Deletes every city of a country. Invalidates once.
    pub fn delete_cities_of_country(&self, country_id: EntityId) -> Result<usize> {
        let _guard = self.ctx.write_guard();
        let country = self.ctx.require_country(country_id)?;
        let deleted = self.ctx.repo.delete_cities_by_country(country_id);
        self.invalidate_for(country_id);
        info!(deleted, country = %country.name, "Deleted all cities of country");
        Ok(deleted)
    }

    fn invalidate_for(&self, country_id: EntityId) {
        self.ctx.invalidate(Mutation::CityChanged {
            country_id,
            nation_ids: self.ctx.repo.nation_ids_of_country(country_id),
        });
    }
}

fn country_gone(country_id: EntityId) -> AppError {
    AppError::NotFound(format!("Country {} not found", country_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Country;
    use crate::services::test_support;

    fn setup() -> (CityService, ServiceContext, EntityId) {
        let ctx = test_support::context();
        let country = ctx.repo.save_country(Country {
            id: 0,
            name: "Belarus".to_string(),
            capital: None,
            population: None,
            area_square_km: None,
            gdp: None,
        });
        (CityService::new(ctx.clone()), ctx, country.id)
    }

    fn new_city(name: &str) -> NewCity {
        NewCity {
            name: name.to_string(),
            population: Some(1000.0),
            area_square_km: None,
        }
    }

    #[test]
    fn test_add_and_list() {
        let (service, _, country_id) = setup();

        service.add_city(country_id, new_city("Minsk")).unwrap();
        service.add_city(country_id, new_city("Gomel")).unwrap();

        let names: Vec<String> = service
            .list_cities()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Minsk", "Gomel"]);
    }

    #[test]
    fn test_add_city_to_missing_country() {
        let (service, _, _) = setup();
        let result = service.add_city(999, new_city("Nowhere"));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_add_duplicate_city_conflicts() {
        let (service, _, country_id) = setup();
        service.add_city(country_id, new_city("Minsk")).unwrap();

        let result = service.add_city(country_id, new_city("Minsk"));
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_add_cities_is_all_or_nothing() {
        let (service, ctx, country_id) = setup();

        let result = service.add_cities(
            country_id,
            vec![new_city("Brest"), new_city("Grodno"), new_city("Brest")],
        );

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(ctx.repo.cities_by_country(country_id).is_empty());
    }

    #[test]
    fn test_list_is_refreshed_after_add() {
        let (service, _, country_id) = setup();

        assert!(service.cities_by_country(country_id).unwrap().is_empty());
        service.add_city(country_id, new_city("Minsk")).unwrap();

        assert_eq!(service.cities_by_country(country_id).unwrap().len(), 1);
        assert_eq!(service.list_cities().unwrap().len(), 1);
    }

    #[test]
    fn test_update_city() {
        let (service, _, country_id) = setup();
        let city = service.add_city(country_id, new_city("Minsk")).unwrap();
        service.list_cities().unwrap();

        let updated = service
            .update_city(
                city.id,
                CityPatch {
                    name: Some("Mensk".to_string()),
                    population: Some(-5.0),
                    area_square_km: Some(400.0),
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Mensk");
        assert_eq!(updated.population, Some(1000.0));
        assert_eq!(updated.area_square_km, Some(400.0));
        assert_eq!(service.list_cities().unwrap()[0].name, "Mensk");
    }

    #[test]
    fn test_update_city_name_clash_is_case_insensitive() {
        let (service, _, country_id) = setup();
        service.add_city(country_id, new_city("Minsk")).unwrap();
        let gomel = service.add_city(country_id, new_city("Gomel")).unwrap();

        let result = service.update_city(
            gomel.id,
            CityPatch {
                name: Some("MINSK".to_string()),
                ..CityPatch::default()
            },
        );
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_delete_city_from_wrong_country() {
        let (service, ctx, country_id) = setup();
        let city = service.add_city(country_id, new_city("Minsk")).unwrap();
        let other = ctx.repo.save_country(Country {
            id: 0,
            name: "Other".to_string(),
            capital: None,
            population: None,
            area_square_km: None,
            gdp: None,
        });

        let result = service.delete_city(other.id, city.id);
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(service.delete_city(country_id, city.id).is_ok());
        assert!(service.list_cities().unwrap().is_empty());
    }

    #[test]
    fn test_delete_cities_of_country() {
        let (service, _, country_id) = setup();
        service
            .add_cities(country_id, vec![new_city("A"), new_city("B")])
            .unwrap();
        assert_eq!(service.cities_by_country(country_id).unwrap().len(), 2);

        assert_eq!(service.delete_cities_of_country(country_id).unwrap(), 2);
        assert!(service.cities_by_country(country_id).unwrap().is_empty());
    }
}
