//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use verso_infra::{MongoConfig, RateLimitConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongo: MongoConfig,
    /// Applies to every request, keyed by client IP.
    pub rate_limit: RateLimitConfig,
    /// Stricter quota for the `/auth` routes.
    pub auth_rate_limit: RateLimitConfig,
    /// Quota for post creation, checked inside the handler.
    pub create_post_rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            mongo: MongoConfig::from_env(),
            rate_limit: limit_from_env("RATE_LIMIT", 100, 900),
            auth_rate_limit: limit_from_env("AUTH_RATE_LIMIT", 5, 900),
            create_post_rate_limit: limit_from_env("CREATE_POST_RATE_LIMIT", 10, 3600),
        }
    }
}

/// Read `<PREFIX>_MAX_REQUESTS` and `<PREFIX>_WINDOW_SECS`, falling back to
/// the given defaults.
fn limit_from_env(prefix: &str, max_requests: u32, window_secs: u64) -> RateLimitConfig {
    let max_requests = env::var(format!("{prefix}_MAX_REQUESTS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(max_requests);
    let window_secs = env::var(format!("{prefix}_WINDOW_SECS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(window_secs);

    RateLimitConfig {
        max_requests,
        window: Duration::from_secs(window_secs),
    }
}
