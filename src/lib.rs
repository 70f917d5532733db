//! Geo Cache - a cached REST service for countries, cities and nations
//!
//! Reads are served through an in-process TTL + LRU cache; every mutation
//! invalidates exactly the cached views it can affect.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod services;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{CacheKey, CacheStore, Invalidator, Mutation, SharedCache};
pub use config::Config;
pub use error::{AppError, Result};
pub use tasks::spawn_cleanup_task;
