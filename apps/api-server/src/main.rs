//! # Meridian API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod drafts;
mod handlers;
mod middleware;
mod state;

use meridian_core::ports::{PasswordService, RateLimiter, TokenService};
use meridian_infra::{
    Argon2PasswordService, FixedWindowRateLimiter, JwtTokenService, RedisRateLimiter,
};

use config::AppConfig;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Meridian API server on {}:{}",
        config.host,
        config.port
    );

    // Build application state
    let state = AppState::new(&config);

    // Rate limiter for the public form endpoints - Redis when configured,
    // otherwise per-process fixed windows
    let limiter = build_rate_limiter(&config).await;

    let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());
    let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

    // Start HTTP server
    HttpServer::new(move || {
        let limiter = limiter.clone();
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(token_service.clone()))
            .app_data(web::Data::new(password_service.clone()))
            .configure(move |cfg| handlers::configure_routes(cfg, limiter))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

async fn build_rate_limiter(config: &AppConfig) -> Arc<dyn RateLimiter> {
    if std::env::var("REDIS_URL").is_ok() {
        match RedisRateLimiter::from_env().await {
            Ok(limiter) => return Arc::new(limiter),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to Redis rate limiter: {}. Using in-memory fallback.",
                    e
                );
            }
        }
    }
    Arc::new(FixedWindowRateLimiter::new(config.rate_limit.clone()))
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,api_server=debug,meridian_infra=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}
