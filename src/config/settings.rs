//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Redis configuration
    pub redis: RedisSettings,

    /// JWT authentication settings
    pub jwt: JwtSettings,

    /// Rate limiting configuration
    pub rate_limit: RateLimitSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Local file storage for uploads
    pub storage: StorageSettings,

    /// Startup seeding from JSON files
    pub seed: SeedSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    pub url: String,

    /// TTL in seconds for cached read models (category list, admin dashboard)
    pub cache_ttl_seconds: u64,
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens
    pub secret: String,

    /// Access token expiry in minutes
    pub access_token_expiry_minutes: i64,

    /// Refresh token expiry in days
    pub refresh_token_expiry_days: i64,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Requests allowed per window on authentication endpoints
    pub auth_requests_per_window: u32,

    /// Requests allowed per window on the rest of the API
    pub api_requests_per_window: u32,

    /// Window length in seconds
    pub window_seconds: u64,

    /// Extra requests tolerated on top of the window allowance
    pub burst_size: u32,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Upload storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory that holds the `uploads/` tree (served under `/uploads`)
    pub root_dir: String,

    /// Hard cap for request bodies carrying uploads, in megabytes
    pub max_upload_mb: u64,
}

/// JSON seed data configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedSettings {
    /// Load seed files at startup when tables are empty
    pub enabled: bool,

    /// Directory containing roles.json, users.json, categories.json, skills.json, courses.json
    pub directory: String,

    /// Password assigned to every seeded user
    pub default_password: String,
}

/// Minimum required length for JWT secret (256 bits = 32 bytes)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if JWT secret is too short.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("redis.cache_ttl_seconds", 60)?
            .set_default("jwt.access_token_expiry_minutes", 15)?
            .set_default("jwt.refresh_token_expiry_days", 7)?
            .set_default("rate_limit.auth_requests_per_window", 5)?
            .set_default("rate_limit.api_requests_per_window", 60)?
            .set_default("rate_limit.window_seconds", 60)?
            .set_default("rate_limit.burst_size", 10)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .set_default("storage.root_dir", ".")?
            .set_default("storage.max_upload_mb", 100)?
            .set_default("seed.enabled", true)?
            .set_default("seed.directory", "seeds")?
            .set_default("seed.default_password", "Password@123")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=8080 -> server.port = 8080
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("storage.root_dir", std::env::var("UPLOADS_ROOT").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| settings.validate())
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "JWT secret must be at least {} characters for security. Current length: {}",
                MIN_JWT_SECRET_LENGTH,
                self.jwt.secret.len()
            )));
        }
        if self.storage.max_upload_mb == 0 {
            return Err(ConfigError::Message(
                "storage.max_upload_mb must be greater than zero".into(),
            ));
        }
        Ok(self)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

impl StorageSettings {
    /// Upload cap in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize) * 1024 * 1024
    }

    /// Request body cap: the upload cap plus room for multipart framing.
    pub fn max_request_bytes(&self) -> usize {
        self.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Settings usable in unit tests without touching the environment.
    pub fn test_settings() -> Settings {
        Settings {
            server: ServerSettings {
                host: "127.0.0.1".into(),
                port: 0,
            },
            database: DatabaseSettings {
                url: "postgres://localhost/smart_courses_test".into(),
                max_connections: 1,
                min_connections: 0,
                acquire_timeout: 1,
                run_migrations: false,
            },
            redis: RedisSettings {
                url: "redis://localhost:6379".into(),
                cache_ttl_seconds: 60,
            },
            jwt: JwtSettings {
                secret: "0123456789abcdef0123456789abcdef".into(),
                access_token_expiry_minutes: 15,
                refresh_token_expiry_days: 7,
            },
            rate_limit: RateLimitSettings {
                auth_requests_per_window: 5,
                api_requests_per_window: 60,
                window_seconds: 60,
                burst_size: 10,
            },
            cors: CorsSettings {
                allowed_origins: vec!["http://localhost:3000".into()],
            },
            storage: StorageSettings {
                root_dir: ".".into(),
                max_upload_mb: 100,
            },
            seed: SeedSettings {
                enabled: false,
                directory: "seeds".into(),
                default_password: "Password@123".into(),
            },
            environment: "test".into(),
        }
    }
}
