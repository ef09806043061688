//! # Verso API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::error::AppError;
use middleware::rate_limit::RateLimitMiddleware;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;
use verso_infra::InMemoryRateLimiter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    // Load configuration
    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Verso API Server on {}:{}",
        config.host,
        config.port
    );

    // Build application state; the database is required
    let state = AppState::new(&config)
        .await
        .map_err(std::io::Error::other)?;

    let general_limiter = Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone()));
    let auth_limiter = Arc::new(InMemoryRateLimiter::new(config.auth_rate_limit.clone()));

    spawn_limiter_cleanup(vec![
        general_limiter.clone(),
        auth_limiter.clone(),
        state.create_post_limiter.clone(),
    ]);

    // The Identity extractor reads the token service from app data
    let token_data = web::Data::new(state.tokens.clone());
    let state_data = web::Data::new(state);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RateLimitMiddleware::new(
                general_limiter.clone(),
                "Too many requests, please try again later",
            ))
            .wrap(RequestIdMiddleware)
            .app_data(state_data.clone())
            .app_data(token_data.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .configure({
                let auth_limiter = auth_limiter.clone();
                move |cfg| handlers::configure_routes(cfg, auth_limiter.clone())
            })
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

/// Periodically drop idle per-key limiter state so the maps stay bounded.
fn spawn_limiter_cleanup(limiters: Vec<Arc<InMemoryRateLimiter>>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            for limiter in &limiters {
                limiter.retain_recent();
            }
        }
    });
}
