//! API Module
//!
//! HTTP handlers and routing for the geo REST API. See `routes` for the
//! endpoint table.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
