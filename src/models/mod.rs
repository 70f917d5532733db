//! Domain entities and HTTP DTOs
//!
//! Entities are what the repository stores; views are what the services
//! cache; requests/responses are the HTTP bodies.

pub mod entities;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use entities::{CachedView, City, Country, CountryView, EntityId, Nation};
pub use requests::{
    CityPatch, CitySearchQuery, CountryPatch, NationPatch, NewCity, NewCountry, NewNation,
    VisitQuery,
};
pub use responses::{HealthResponse, StatsResponse, VisitResponse};
