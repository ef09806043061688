//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use verso_core::error::RepoError;
use verso_core::ports::{PasswordService, TokenService, UserRepository};
use verso_core::service::{AnalyticsService, EngagementService, PostService};
use verso_infra::{
    Argon2PasswordService, InMemoryRateLimiter, JwtTokenService, MongoAnalyticsRepository,
    MongoBookmarkRepository, MongoPostRepository, MongoUserRepository, connect, ensure_indexes,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub engagement: Arc<EngagementService>,
    pub analytics: Arc<AnalyticsService>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    /// Post-creation quota, checked inside the create handler.
    pub create_post_limiter: Arc<InMemoryRateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    /// Connect to MongoDB, ensure indexes, and wire the services.
    ///
    /// The database is required: startup fails when it is unreachable.
    pub async fn new(config: &AppConfig) -> Result<Self, RepoError> {
        let db = connect(&config.mongo).await?;
        ensure_indexes(&db).await?;

        let users: Arc<dyn UserRepository> = Arc::new(MongoUserRepository::new(&db));
        let posts = Arc::new(MongoPostRepository::new(&db));
        let bookmarks = Arc::new(MongoBookmarkRepository::new(&db));
        let analytics = Arc::new(MongoAnalyticsRepository::new(&db));

        let post_service = Arc::new(PostService::new(
            posts.clone(),
            users.clone(),
            bookmarks.clone(),
            analytics.clone(),
        ));
        let engagement_service = Arc::new(EngagementService::new(
            posts.clone(),
            bookmarks,
            analytics.clone(),
            users.clone(),
        ));
        let analytics_service = Arc::new(AnalyticsService::new(posts, analytics));

        tracing::info!("Application state initialized");

        Ok(Self {
            posts: post_service,
            engagement: engagement_service,
            analytics: analytics_service,
            users,
            tokens: Arc::new(JwtTokenService::from_env()),
            passwords: Arc::new(Argon2PasswordService::new()),
            create_post_limiter: Arc::new(InMemoryRateLimiter::new(
                config.create_post_rate_limit.clone(),
            )),
            started_at: Instant::now(),
        })
    }
}
