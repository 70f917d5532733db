//! Country operations.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::cache::{CacheKey, Mutation};
use crate::error::{AppError, Result};
use crate::models::{CachedView, Country, CountryPatch, CountryView, EntityId, NewCountry};
use crate::services::{ensure_valid, ServiceContext};

#[derive(Clone)]
pub struct CountryService {
    ctx: ServiceContext,
}

impl CountryService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// All country snapshots (cached under `allCountries`).
    pub fn list_countries(&self) -> Result<Vec<CountryView>> {
        self.ctx.cache_aside(
            CacheKey::AllCountries,
            CachedView::into_countries,
            CachedView::Countries,
            || {
                Ok(self
                    .ctx
                    .repo
                    .list_countries()
                    .into_iter()
                    .map(|country| self.ctx.country_view(country))
                    .collect())
            },
        )
    }

    /// One country snapshot (cached under `countryId_{id}`).
    pub fn get_country(&self, id: EntityId) -> Result<CountryView> {
        self.ctx.cache_aside(
            CacheKey::Country(id),
            CachedView::into_country,
            CachedView::Country,
            || {
                let country = self.ctx.require_country(id)?;
                Ok(self.ctx.country_view(country))
            },
        )
    }

    /// Creates a country. Names are unique.
    pub fn add_country(&self, request: NewCountry) -> Result<Country> {
        let mut added = self.add_countries(vec![request])?;
        added
            .pop()
            .ok_or_else(|| AppError::InvalidRequest("No country to add".to_string()))
    }

    /// Creates several countries, all or nothing. Invalidates once.
    pub fn add_countries(&self, requests: Vec<NewCountry>) -> Result<Vec<Country>> {
        let _guard = self.ctx.write_guard();
        let mut seen = HashSet::new();
        for request in &requests {
            ensure_valid(request.validate())?;
            if !seen.insert(request.name.as_str())
                || self.ctx.repo.find_country_by_name(&request.name).is_some()
            {
                warn!(name = %request.name, "Country already exists");
                return Err(AppError::Conflict(format!(
                    "Country {} already exists",
                    request.name
                )));
            }
        }

        let added: Vec<Country> = requests
            .into_iter()
            .map(|request| {
                self.ctx.repo.save_country(Country {
                    id: 0,
                    name: request.name,
                    capital: request.capital,
                    population: request.population,
                    area_square_km: request.area_square_km,
                    gdp: request.gdp,
                })
            })
            .collect();

        if !added.is_empty() {
            self.ctx.invalidate(Mutation::CountryCreated);
        }
        for country in &added {
            info!(id = country.id, name = %country.name, "Created country");
        }
        Ok(added)
    }

    /// Edits a country's fields in place. Its id never changes.
    pub fn update_country(&self, id: EntityId, patch: CountryPatch) -> Result<Country> {
        ensure_valid(patch.validate())?;
        let _guard = self.ctx.write_guard();
        let mut country = self.ctx.require_country(id)?;

        if let Some(name) = patch.name.filter(|n| *n != country.name) {
            if self.ctx.repo.find_country_by_name(&name).is_some() {
                warn!(%name, "Country name conflict");
                return Err(AppError::Conflict(format!("Country {} already exists", name)));
            }
            country.name = name;
        }
        if let Some(capital) = patch.capital {
            country.capital = Some(capital);
        }
        if let Some(population) = patch.population {
            country.population = Some(population);
        }
        if let Some(area) = patch.area_square_km {
            country.area_square_km = Some(area);
        }
        if let Some(gdp) = patch.gdp {
            country.gdp = Some(gdp);
        }

        let country = self
            .ctx
            .repo
            .update_country(country)
            .ok_or_else(|| AppError::NotFound(format!("Country {} not found", id)))?;
        self.ctx.invalidate(Mutation::CountryUpdated {
            country_id: id,
            nation_ids: self.ctx.repo.nation_ids_of_country(id),
        });
        info!(id, "Updated country");
        Ok(country)
    }

    /// Deletes a country along with its cities and nation links.
    pub fn delete_country(&self, id: EntityId) -> Result<()> {
        let _guard = self.ctx.write_guard();
        self.ctx.require_country(id)?;
        let nation_ids = self.ctx.repo.nation_ids_of_country(id);

        self.ctx.repo.delete_country(id);
        self.ctx.invalidate(Mutation::CountryDeleted {
            country_id: id,
            nation_ids,
        });
        info!(id, "Deleted country");
        Ok(())
    }

    /// Deletes every country, city and link, then clears the cache.
    pub fn delete_all_countries(&self) {
        let _guard = self.ctx.write_guard();
        self.ctx.repo.delete_all_countries();
        self.ctx.invalidate(Mutation::AllCountriesDeleted);
        info!("Deleted all countries");
    }

    /// Countries with a city whose name contains `city_name`. Not cached.
    pub fn search_countries_by_city_name(&self, city_name: &str) -> Vec<Country> {
        self.ctx.access_counter.increment();
        self.ctx.repo.find_countries_by_city_name(city_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{City, Nation};
    use crate::services::test_support;

    fn new_country(name: &str) -> NewCountry {
        NewCountry {
            name: name.to_string(),
            capital: None,
            population: None,
            area_square_km: None,
            gdp: None,
        }
    }

    fn setup() -> (CountryService, ServiceContext) {
        let ctx = test_support::context();
        (CountryService::new(ctx.clone()), ctx)
    }

    #[test]
    fn test_add_and_get_country() {
        let (service, _) = setup();
        let country = service.add_country(new_country("Belarus")).unwrap();

        let view = service.get_country(country.id).unwrap();
        assert_eq!(view.country, country);
        assert!(view.cities.is_empty());
        assert!(view.nations.is_empty());
    }

    #[test]
    fn test_get_missing_country() {
        let (service, ctx) = setup();
        assert!(matches!(service.get_country(42), Err(AppError::NotFound(_))));
        assert!(!ctx.cache.contains_key("countryId_42"));
    }

    #[test]
    fn test_duplicate_country_conflicts() {
        let (service, _) = setup();
        service.add_country(new_country("Belarus")).unwrap();

        assert!(matches!(
            service.add_country(new_country("Belarus")),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            service.add_countries(vec![new_country("Poland"), new_country("Poland")]),
            Err(AppError::Conflict(_))
        ));
        assert_eq!(service.list_countries().unwrap().len(), 1);
    }

    #[test]
    fn test_create_refreshes_listing() {
        let (service, _) = setup();
        assert!(service.list_countries().unwrap().is_empty());

        service
            .add_countries(vec![new_country("A"), new_country("B")])
            .unwrap();
        assert_eq!(service.list_countries().unwrap().len(), 2);
    }

    #[test]
    fn test_update_country_refreshes_snapshot() {
        let (service, _) = setup();
        let country = service.add_country(new_country("Belarus")).unwrap();
        service.get_country(country.id).unwrap();
        service.list_countries().unwrap();

        service
            .update_country(
                country.id,
                CountryPatch {
                    capital: Some("Minsk".to_string()),
                    ..CountryPatch::default()
                },
            )
            .unwrap();

        let view = service.get_country(country.id).unwrap();
        assert_eq!(view.country.capital.as_deref(), Some("Minsk"));
        assert_eq!(
            service.list_countries().unwrap()[0].country.capital.as_deref(),
            Some("Minsk")
        );
    }

    #[test]
    fn test_rename_to_existing_conflicts() {
        let (service, _) = setup();
        service.add_country(new_country("A")).unwrap();
        let b = service.add_country(new_country("B")).unwrap();

        let result = service.update_country(
            b.id,
            CountryPatch {
                name: Some("A".to_string()),
                ..CountryPatch::default()
            },
        );
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_delete_country_cascades_and_invalidates() {
        let (service, ctx) = setup();
        let country = service.add_country(new_country("A")).unwrap();
        ctx.repo.save_city(City {
            id: 0,
            name: "a1".to_string(),
            population: None,
            area_square_km: None,
            country_id: country.id,
        });
        let nation = ctx.repo.save_nation(Nation {
            id: 0,
            name: "N".to_string(),
            language: None,
            religion: None,
        });
        ctx.repo.link(country.id, nation.id);

        assert_eq!(service.get_country(country.id).unwrap().cities.len(), 1);
        assert_eq!(service.list_countries().unwrap().len(), 1);

        service.delete_country(country.id).unwrap();

        assert!(matches!(
            service.get_country(country.id),
            Err(AppError::NotFound(_))
        ));
        assert!(service.list_countries().unwrap().is_empty());
        assert!(ctx.repo.list_cities().is_empty());
        assert!(ctx.repo.countries_of_nation(nation.id).is_empty());
    }

    #[test]
    fn test_delete_all_clears_cache() {
        let (service, ctx) = setup();
        service.add_country(new_country("A")).unwrap();
        service.list_countries().unwrap();
        assert!(!ctx.cache.is_empty());

        service.delete_all_countries();

        assert!(ctx.cache.is_empty());
        assert!(service.list_countries().unwrap().is_empty());
    }

    #[test]
    fn test_search_by_city_name() {
        let (service, ctx) = setup();
        let a = service.add_country(new_country("A")).unwrap();
        ctx.repo.save_city(City {
            id: 0,
            name: "Minsk".to_string(),
            population: None,
            area_square_km: None,
            country_id: a.id,
        });

        assert_eq!(service.search_countries_by_city_name("MIN"), vec![a]);
        assert!(service.search_countries_by_city_name("Paris").is_empty());
    }
}
