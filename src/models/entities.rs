//! Domain entities and read views
//!
//! Plain data as stored by the repository, plus the composed views the
//! services cache.

use serde::{Deserialize, Serialize};

/// Identifier shared by all entity kinds. `0` marks an unsaved entity.
pub type EntityId = u64;

/// A city, owned by exactly one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: EntityId,
    pub name: String,
    pub population: Option<f64>,
    pub area_square_km: Option<f64>,
    pub country_id: EntityId,
}

/// A country. Owns cities, and is linked to nations many-to-many.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: EntityId,
    pub name: String,
    pub capital: Option<String>,
    pub population: Option<f64>,
    pub area_square_km: Option<f64>,
    pub gdp: Option<f64>,
}

/// A nation, linked to any number of countries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nation {
    pub id: EntityId,
    pub name: String,
    pub language: Option<String>,
    pub religion: Option<String>,
}

/// Country snapshot with its relationships resolved one hop deep.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryView {
    #[serde(flatten)]
    pub country: Country,
    pub cities: Vec<City>,
    pub nations: Vec<Nation>,
}

// == Cached View ==
/// Value type stored in the cache: one variant per cached query shape.
///
/// Readers must check the variant; a mismatch is treated as a miss.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedView {
    Cities(Vec<City>),
    Country(CountryView),
    Countries(Vec<CountryView>),
    Nations(Vec<Nation>),
}

impl CachedView {
    pub fn into_cities(self) -> Option<Vec<City>> {
        match self {
            CachedView::Cities(cities) => Some(cities),
            _ => None,
        }
    }

    pub fn into_country(self) -> Option<CountryView> {
        match self {
            CachedView::Country(view) => Some(view),
            _ => None,
        }
    }

    pub fn into_countries(self) -> Option<Vec<CountryView>> {
        match self {
            CachedView::Countries(views) => Some(views),
            _ => None,
        }
    }

    pub fn into_nations(self) -> Option<Vec<Nation>> {
        match self {
            CachedView::Nations(nations) => Some(nations),
            _ => None,
        }
    }
}
