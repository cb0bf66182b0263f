//! Cache Module
//!
//! Redis connection management and caching utilities.
//!
//! This module provides:
//! - Redis connection management with automatic reconnection
//! - A `Cache` trait for the few read models worth caching
//! - A `RedisCache` implementation storing JSON values
//! - Predefined keys for consistent cache key naming
//!
//! The same `ConnectionManager` also backs the rate limiter.

mod cache_service;

#[cfg(test)]
pub use cache_service::InMemoryCache;
pub use cache_service::{Cache, RedisCache};

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Prefix applied to every cache key written by the application.
pub const KEY_PREFIX: &str = "smart_courses:";

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(settings), fields(url = %settings.url))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Cache keys.
pub mod keys {
    /// Public category list with course counts
    pub const CATEGORY_LIST: &str = "categories:all";

    /// Admin dashboard statistics
    pub const ADMIN_DASHBOARD: &str = "dashboard:admin";

    /// Prefix for rate limiting windows (e.g., "ratelimit:auth:10.0.0.1")
    pub const RATE_LIMIT: &str = "ratelimit:";

    /// Generates a rate limit key
    #[inline]
    pub fn rate_limit(class: &str, client: impl std::fmt::Display) -> String {
        format!("{}{}:{}", RATE_LIMIT, class, client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_key() {
        assert_eq!(keys::rate_limit("auth", "10.0.0.1"), "ratelimit:auth:10.0.0.1");
    }
}
