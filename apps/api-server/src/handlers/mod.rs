//! HTTP handlers and route configuration.

mod auth;
mod enquiry;
mod health;
mod portal;

use std::sync::Arc;

use actix_web::web;

use meridian_core::ports::RateLimiter;

use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiter: Arc<dyn RateLimiter>) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Public form submissions, throttled per client
            .service(
                web::scope("/enquiries")
                    .wrap(RateLimitMiddleware::new(limiter))
                    .route("", web::post().to(enquiry::submit)),
            )
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Portal routes (Bearer auth via the Identity extractor)
            .service(
                web::scope("/portal")
                    .route("/profile", web::get().to(portal::get_profile))
                    .route("/profile", web::put().to(portal::put_profile))
                    .route("/profile/draft", web::put().to(portal::put_profile_draft))
                    .route(
                        "/profile/draft/save",
                        web::post().to(portal::save_profile_draft),
                    )
                    .route(
                        "/profile/draft/status",
                        web::get().to(portal::get_draft_status),
                    )
                    .route("/ucat", web::get().to(portal::list_ucat))
                    .route("/ucat", web::post().to(portal::add_ucat))
                    .route("/ucat/{id}", web::delete().to(portal::delete_ucat))
                    .route("/shortlist", web::get().to(portal::list_shortlist))
                    .route("/shortlist", web::post().to(portal::add_shortlist))
                    .route("/shortlist/{id}", web::delete().to(portal::delete_shortlist)),
            ),
    );
}
