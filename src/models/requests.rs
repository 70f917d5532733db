//! Request DTOs for the geo API
//!
//! Defines the structure of incoming HTTP request bodies. Creation payloads
//! carry no id; patches leave absent fields untouched.

use serde::Deserialize;

/// Maximum accepted length for any name field
pub const MAX_NAME_LENGTH: usize = 256;

fn validate_name(name: &str) -> Option<String> {
    if name.trim().is_empty() {
        return Some("Name cannot be empty".to_string());
    }
    if name.len() > MAX_NAME_LENGTH {
        return Some(format!(
            "Name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        ));
    }
    None
}

/// Request body for creating a city (POST /api/countries/:id/city)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCity {
    pub name: String,
    #[serde(default)]
    pub population: Option<f64>,
    #[serde(default)]
    pub area_square_km: Option<f64>,
}

impl NewCity {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_name(&self.name)
    }
}

/// Request body for PUT /api/cities/:id
///
/// Non-positive population or area values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub population: Option<f64>,
    #[serde(default)]
    pub area_square_km: Option<f64>,
}

impl CityPatch {
    pub fn validate(&self) -> Option<String> {
        self.name.as_deref().and_then(validate_name)
    }
}

/// Request body for creating a country (POST /api/countries)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCountry {
    pub name: String,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub population: Option<f64>,
    #[serde(default)]
    pub area_square_km: Option<f64>,
    #[serde(default)]
    pub gdp: Option<f64>,
}

impl NewCountry {
    pub fn validate(&self) -> Option<String> {
        validate_name(&self.name)
    }
}

/// Request body for PUT /api/countries/:id
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub population: Option<f64>,
    #[serde(default)]
    pub area_square_km: Option<f64>,
    #[serde(default)]
    pub gdp: Option<f64>,
}

impl CountryPatch {
    pub fn validate(&self) -> Option<String> {
        self.name.as_deref().and_then(validate_name)
    }
}

/// Request body for POST /api/countries/:id/nations
#[derive(Debug, Clone, Deserialize)]
pub struct NewNation {
    pub name: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,
}

impl NewNation {
    pub fn validate(&self) -> Option<String> {
        validate_name(&self.name)
    }
}

/// Request body for PUT /api/nations/:id
///
/// Empty strings are treated like absent fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NationPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,
}

/// Query string for GET /api/countries/search
#[derive(Debug, Clone, Deserialize)]
pub struct CitySearchQuery {
    pub city: String,
}

/// Query string for GET /api/visits
#[derive(Debug, Clone, Deserialize)]
pub struct VisitQuery {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_city_deserialize() {
        let json = r#"{"name": "Minsk", "population": 2000000, "areaSquareKm": 409.5}"#;
        let req: NewCity = serde_json::from_str(json).unwrap();
        assert_eq!(req.name, "Minsk");
        assert_eq!(req.population, Some(2_000_000.0));
        assert_eq!(req.area_square_km, Some(409.5));
    }

    #[test]
    fn test_new_country_optional_fields() {
        let req: NewCountry = serde_json::from_str(r#"{"name": "Poland"}"#).unwrap();
        assert_eq!(req.name, "Poland");
        assert!(req.capital.is_none());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_name() {
        let req = NewNation {
            name: "   ".to_string(),
            language: None,
            religion: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_long_name() {
        let req = NewCity {
            name: "x".repeat(MAX_NAME_LENGTH + 1),
            population: None,
            area_square_km: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_patch_without_name_is_valid() {
        let patch: CountryPatch = serde_json::from_str(r#"{"gdp": 1.5}"#).unwrap();
        assert!(patch.validate().is_none());
        assert_eq!(patch.gdp, Some(1.5));
    }
}
