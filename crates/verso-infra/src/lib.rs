//! # Verso Infrastructure
//!
//! Concrete implementations of the ports defined in `verso-core`:
//! MongoDB persistence, JWT and Argon2 authentication, and in-process
//! rate limiting.

pub mod auth;
pub mod database;
pub mod rate_limit;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{
    MongoAnalyticsRepository, MongoBookmarkRepository, MongoConfig, MongoPostRepository,
    MongoUserRepository, connect, ensure_indexes,
};
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
