//! Nation operations and country↔nation links.

use tracing::info;

use crate::cache::{CacheKey, Mutation};
use crate::error::{AppError, Result};
use crate::models::{CachedView, CountryView, EntityId, Nation, NationPatch, NewNation};
use crate::services::{ensure_valid, ServiceContext};

#[derive(Clone)]
pub struct NationService {
    ctx: ServiceContext,
}

impl NationService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// All nations (cached under `allNations`).
    pub fn list_nations(&self) -> Result<Vec<Nation>> {
        self.ctx.cache_aside(
            CacheKey::AllNations,
            CachedView::into_nations,
            CachedView::Nations,
            || Ok(self.ctx.repo.list_nations()),
        )
    }

    /// Nations linked to a country (cached under `allNationsByCountryId_{id}`).
    pub fn nations_by_country(&self, country_id: EntityId) -> Result<Vec<Nation>> {
        self.ctx.cache_aside(
            CacheKey::NationsByCountry(country_id),
            CachedView::into_nations,
            CachedView::Nations,
            || {
                self.ctx.require_country(country_id)?;
                Ok(self.ctx.repo.nations_of_country(country_id))
            },
        )
    }

    /// Snapshots of the countries linked to a nation (cached under
    /// `allCountriesByNationId_{id}`).
    pub fn countries_by_nation(&self, nation_id: EntityId) -> Result<Vec<CountryView>> {
        self.ctx.cache_aside(
            CacheKey::CountriesByNation(nation_id),
            CachedView::into_countries,
            CachedView::Countries,
            || {
                self.require_nation(nation_id)?;
                Ok(self
                    .ctx
                    .repo
                    .countries_of_nation(nation_id)
                    .into_iter()
                    .map(|country| self.ctx.country_view(country))
                    .collect())
            },
        )
    }

    /// Links a nation to a country, reusing an existing nation of the same
    /// name or creating it.
    pub fn add_nation_to_country(&self, country_id: EntityId, request: NewNation) -> Result<Nation> {
        ensure_valid(request.validate())?;
        let _guard = self.ctx.write_guard();
        let country = self.ctx.require_country(country_id)?;

        let already_linked = self
            .ctx
            .repo
            .nations_of_country(country_id)
            .iter()
            .any(|n| n.name == request.name);
        if already_linked {
            return Err(AppError::Conflict(format!(
                "Nation {} already exists in the country {}",
                request.name, country.name
            )));
        }

        let nation = match self.ctx.repo.find_nation_by_name(&request.name) {
            Some(existing) => existing,
            None => self.ctx.repo.save_nation(Nation {
                id: 0,
                name: request.name,
                language: request.language,
                religion: request.religion,
            }),
        };
        if !self.ctx.repo.link(country_id, nation.id) {
            return Err(AppError::NotFound(format!(
                "Country {} not found",
                country_id
            )));
        }

        self.invalidate_for(nation.id, &[]);
        info!(nation = %nation.name, country = %country.name, "Linked nation to country");
        Ok(nation)
    }

    /// Edits a nation. Empty or unchanged fields are ignored; names are unique.
    pub fn update_nation(&self, nation_id: EntityId, patch: NationPatch) -> Result<Nation> {
        let _guard = self.ctx.write_guard();
        let mut nation = self.require_nation(nation_id)?;

        if let Some(name) = non_empty(patch.name).filter(|n| *n != nation.name) {
            if self.ctx.repo.find_nation_by_name(&name).is_some() {
                return Err(AppError::Conflict(format!("Nation {} already exists", name)));
            }
            nation.name = name;
        }
        if let Some(language) = non_empty(patch.language) {
            nation.language = Some(language);
        }
        if let Some(religion) = non_empty(patch.religion) {
            nation.religion = Some(religion);
        }

        let nation = self
            .ctx
            .repo
            .update_nation(nation)
            .ok_or_else(|| AppError::NotFound(format!("Nation {} not found", nation_id)))?;
        self.invalidate_for(nation_id, &[]);
        info!(nation_id, "Updated nation");
        Ok(nation)
    }

    /// Deletes a nation after unlinking it from every country.
    pub fn delete_nation(&self, nation_id: EntityId) -> Result<()> {
        let _guard = self.ctx.write_guard();
        self.require_nation(nation_id)?;
        let formerly_linked = self.ctx.repo.country_ids_of_nation(nation_id);

        self.ctx.repo.delete_nation(nation_id);
        self.invalidate_for(nation_id, &formerly_linked);
        info!(nation_id, "Deleted nation");
        Ok(())
    }

    /// Unlinks a nation from one country. Unlinking a pair that is not linked
    /// succeeds without change.
    pub fn remove_nation_from_country(&self, country_id: EntityId, nation_id: EntityId) -> Result<()> {
        let _guard = self.ctx.write_guard();
        self.ctx.require_country(country_id)?;
        self.require_nation(nation_id)?;

        let removed = self.ctx.repo.unlink(country_id, nation_id);
        self.invalidate_for(nation_id, &[country_id]);
        info!(country_id, nation_id, removed, "Unlinked nation from country");
        Ok(())
    }

    fn require_nation(&self, id: EntityId) -> Result<Nation> {
        self.ctx
            .repo
            .find_nation(id)
            .ok_or_else(|| AppError::NotFound(format!("Nation {} not found", id)))
    }

    /// `extra` lists countries no longer linked that still need invalidating.
    fn invalidate_for(&self, nation_id: EntityId, extra: &[EntityId]) {
        let mut country_ids = self.ctx.repo.country_ids_of_nation(nation_id);
        country_ids.extend_from_slice(extra);
        self.ctx.invalidate(Mutation::NationChanged {
            nation_id,
            country_ids,
        });
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
