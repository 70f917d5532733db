//! Configuration Module
//!
//! Handles loading and validating server configuration from environment
//! variables.

use std::env;
use std::time::Duration;

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_TTL_SECS};
use crate::error::{AppError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub cache_capacity: usize,
    /// Default TTL in seconds for cached query results
    pub default_ttl_secs: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL_SECS` - Default TTL in seconds (default: 1800)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CLEANUP_INTERVAL_SECS` - Sweep frequency in seconds (default: 60)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_capacity: env_or("CACHE_CAPACITY", defaults.cache_capacity),
            default_ttl_secs: env_or("CACHE_DEFAULT_TTL_SECS", defaults.default_ttl_secs),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval_secs: env_or("CLEANUP_INTERVAL_SECS", defaults.cleanup_interval_secs),
        }
    }

    /// Rejects configurations the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(AppError::InvalidConfig(
                "CACHE_CAPACITY must be at least 1".to_string(),
            ));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(AppError::InvalidConfig(
                "CLEANUP_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CAPACITY,
            default_ttl_secs: DEFAULT_TTL_SECS,
            server_port: 8080,
            cleanup_interval_secs: 60,
        }
    }
}
