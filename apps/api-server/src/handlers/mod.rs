//! HTTP handlers and route configuration.

mod analytics;
mod auth;
mod health;
mod posts;
mod users;

use std::sync::Arc;

use actix_web::web;
use verso_core::ports::RateLimiter;

use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes.
///
/// The `/auth` scope gets its own, stricter limiter; everything else is
/// covered by the app-wide one installed in `main`.
pub fn configure_routes(cfg: &mut web::ServiceConfig, auth_limiter: Arc<dyn RateLimiter>) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .wrap(RateLimitMiddleware::new(
                        auth_limiter,
                        "Too many authentication attempts, please try again later",
                    ))
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // User routes
            .service(
                web::scope("/users")
                    .route("", web::get().to(users::list))
                    .route("", web::post().to(users::create)),
            )
            // Post routes
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    .route("/{slug}", web::get().to(posts::get_by_slug))
                    .route("/{slug}", web::put().to(posts::update))
                    .route("/{slug}", web::delete().to(posts::delete))
                    .route("/{slug}/like", web::put().to(posts::toggle_like))
                    .route("/{slug}/bookmark", web::put().to(posts::toggle_bookmark))
                    .route("/{slug}/comments", web::post().to(posts::add_comment)),
            )
            // Analytics routes
            .service(
                web::scope("/analytics")
                    .route("/dashboard", web::get().to(analytics::dashboard))
                    .route("/post/{post_id}", web::get().to(analytics::post_detail)),
            ),
    );
}
