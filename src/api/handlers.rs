//! API Handlers
//!
//! HTTP request handlers for each endpoint. Handlers only translate between
//! HTTP and the services; caching and invalidation live below them.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};

use crate::config::Config;
use crate::error::Result;
use crate::metrics::{AccessCounter, VisitCounter};
use crate::models::{
    City, CityPatch, CitySearchQuery, Country, CountryPatch, CountryView, EntityId,
    HealthResponse, Nation, NationPatch, NewCity, NewCountry, NewNation, StatsResponse,
    VisitQuery, VisitResponse,
};
use crate::repository::{InMemoryRepository, Repository};
use crate::services::{CityService, CountryService, NationService, ServiceContext, ViewCache};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe view cache
    pub cache: Arc<ViewCache>,
    pub cities: CityService,
    pub countries: CountryService,
    pub nations: NationService,
    pub access_counter: Arc<AccessCounter>,
    pub visits: Arc<VisitCounter>,
}

impl AppState {
    /// Wires the services around the given repository and cache.
    pub fn new(repo: Arc<dyn Repository>, cache: ViewCache) -> Self {
        let cache = Arc::new(cache);
        let access_counter = Arc::new(AccessCounter::new());
        let ctx = ServiceContext::new(repo, Arc::clone(&cache), Arc::clone(&access_counter));

        Self {
            cache,
            cities: CityService::new(ctx.clone()),
            countries: CountryService::new(ctx.clone()),
            nations: NationService::new(ctx),
            access_counter,
            visits: Arc::new(VisitCounter::new()),
        }
    }

    /// Creates an AppState with an in-memory repository and a cache sized
    /// from the Config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = ViewCache::from_config(config)?;
        Ok(Self::new(Arc::new(InMemoryRepository::new()), cache))
    }
}

// == Cities ==

/// GET /api/cities
pub async fn list_cities(State(state): State<AppState>) -> Result<Json<Vec<City>>> {
    Ok(Json(state.cities.list_cities()?))
}

/// GET /api/countries/:id/cities
pub async fn cities_by_country(
    State(state): State<AppState>,
    Path(country_id): Path<EntityId>,
) -> Result<Json<Vec<City>>> {
    Ok(Json(state.cities.cities_by_country(country_id)?))
}

/// POST /api/countries/:id/city
pub async fn add_city(
    State(state): State<AppState>,
    Path(country_id): Path<EntityId>,
    Json(req): Json<NewCity>,
) -> Result<(StatusCode, Json<City>)> {
    let city = state.cities.add_city(country_id, req)?;
    Ok((StatusCode::CREATED, Json(city)))
}

/// POST /api/countries/:id/cities
pub async fn add_cities(
    State(state): State<AppState>,
    Path(country_id): Path<EntityId>,
    Json(req): Json<Vec<NewCity>>,
) -> Result<(StatusCode, Json<Vec<City>>)> {
    let cities = state.cities.add_cities(country_id, req)?;
    Ok((StatusCode::CREATED, Json(cities)))
}

/// PUT /api/cities/:id
pub async fn update_city(
    State(state): State<AppState>,
    Path(city_id): Path<EntityId>,
    Json(patch): Json<CityPatch>,
) -> Result<Json<City>> {
    Ok(Json(state.cities.update_city(city_id, patch)?))
}

/// DELETE /api/countries/:id/cities/:city_id
pub async fn delete_city(
    State(state): State<AppState>,
    Path((country_id, city_id)): Path<(EntityId, EntityId)>,
) -> Result<StatusCode> {
    state.cities.delete_city(country_id, city_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/countries/:id/cities
pub async fn delete_cities_of_country(
    State(state): State<AppState>,
    Path(country_id): Path<EntityId>,
) -> Result<StatusCode> {
    state.cities.delete_cities_of_country(country_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// == Countries ==

/// GET /api/countries
pub async fn list_countries(State(state): State<AppState>) -> Result<Json<Vec<CountryView>>> {
    Ok(Json(state.countries.list_countries()?))
}

/// GET /api/countries/:id
pub async fn get_country(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<CountryView>> {
    Ok(Json(state.countries.get_country(id)?))
}

/// POST /api/countries
pub async fn add_country(
    State(state): State<AppState>,
    Json(req): Json<NewCountry>,
) -> Result<(StatusCode, Json<Country>)> {
    let country = state.countries.add_country(req)?;
    Ok((StatusCode::CREATED, Json(country)))
}

/// POST /api/countries/bulk
pub async fn add_countries(
    State(state): State<AppState>,
    Json(req): Json<Vec<NewCountry>>,
) -> Result<(StatusCode, Json<Vec<Country>>)> {
    let countries = state.countries.add_countries(req)?;
    Ok((StatusCode::CREATED, Json(countries)))
}

/// PUT /api/countries/:id
pub async fn update_country(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(patch): Json<CountryPatch>,
) -> Result<Json<Country>> {
    Ok(Json(state.countries.update_country(id, patch)?))
}

/// DELETE /api/countries/:id
pub async fn delete_country(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<StatusCode> {
    state.countries.delete_country(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/countries
pub async fn delete_all_countries(State(state): State<AppState>) -> StatusCode {
    state.countries.delete_all_countries();
    StatusCode::NO_CONTENT
}

/// GET /api/countries/search?city=
pub async fn search_countries(
    State(state): State<AppState>,
    Query(query): Query<CitySearchQuery>,
) -> Json<Vec<Country>> {
    Json(state.countries.search_countries_by_city_name(&query.city))
}

// == Nations ==

/// GET /api/nations
pub async fn list_nations(State(state): State<AppState>) -> Result<Json<Vec<Nation>>> {
    Ok(Json(state.nations.list_nations()?))
}

/// GET /api/countries/:id/nations
pub async fn nations_by_country(
    State(state): State<AppState>,
    Path(country_id): Path<EntityId>,
) -> Result<Json<Vec<Nation>>> {
    Ok(Json(state.nations.nations_by_country(country_id)?))
}

/// GET /api/nations/:id/countries
pub async fn countries_by_nation(
    State(state): State<AppState>,
    Path(nation_id): Path<EntityId>,
) -> Result<Json<Vec<CountryView>>> {
    Ok(Json(state.nations.countries_by_nation(nation_id)?))
}

/// POST /api/countries/:id/nations
pub async fn add_nation_to_country(
    State(state): State<AppState>,
    Path(country_id): Path<EntityId>,
    Json(req): Json<NewNation>,
) -> Result<(StatusCode, Json<Nation>)> {
    let nation = state.nations.add_nation_to_country(country_id, req)?;
    Ok((StatusCode::CREATED, Json(nation)))
}

/// PUT /api/nations/:id
pub async fn update_nation(
    State(state): State<AppState>,
    Path(nation_id): Path<EntityId>,
    Json(patch): Json<NationPatch>,
) -> Result<Json<Nation>> {
    Ok(Json(state.nations.update_nation(nation_id, patch)?))
}

/// DELETE /api/nations/:id
pub async fn delete_nation(
    State(state): State<AppState>,
    Path(nation_id): Path<EntityId>,
) -> Result<StatusCode> {
    state.nations.delete_nation(nation_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/countries/:id/nations/:nation_id
pub async fn remove_nation_from_country(
    State(state): State<AppState>,
    Path((country_id, nation_id)): Path<(EntityId, EntityId)>,
) -> Result<StatusCode> {
    state.nations.remove_nation_from_country(country_id, nation_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// == Operations ==

/// GET /api/cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats();
    Json(StatsResponse::new(&stats, state.access_counter.get()))
}

/// GET /api/visits?url= (a route template such as `/api/countries/:id`)
pub async fn visits_handler(
    State(state): State<AppState>,
    Query(query): Query<VisitQuery>,
) -> Json<VisitResponse> {
    let visits = state.visits.count(&query.url);
    Json(VisitResponse {
        url: query.url,
        visits,
    })
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Middleware counting requests per route template (`/api/countries/:id`).
///
/// Requests that match no route are not counted, so the set of keys is
/// bounded by the router.
pub async fn track_visits(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(route) = request.extensions().get::<MatchedPath>() {
        state.visits.record(route.as_str());
    }
    next.run(request).await
}
