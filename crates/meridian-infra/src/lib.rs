//! # Meridian Infrastructure
//!
//! Concrete implementations of the ports defined in `meridian-core`.
//! This crate contains the rate limiter, the auto-save pipeline, the email
//! relay, authentication, and the hosted data service adapters.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-process backends only
//! - `redis` - Redis-backed rate limiting for multi-instance deployments

pub mod auth;
pub mod autosave;
pub mod mailer;
pub mod rate_limit;
pub mod store;

// Re-exports - In-Process
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use autosave::{
    AutosaveConfig, AutosaveController, AutosaveError, AutosaveHooks, SaveFuture, SaveState,
    SaveStatus,
};
pub use mailer::{HttpMailer, InMemoryMailer, MailerConfig};
pub use rate_limit::{FixedWindowConfig, FixedWindowRateLimiter};
pub use store::memory::{
    InMemoryEnquiryRepository, InMemoryProfileRepository, InMemoryShortlistRepository,
    InMemoryUcatRepository, InMemoryUserRepository,
};
pub use store::{DataApiClient, DataApiConfig};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use rate_limit::{RedisRateLimitConfig, RedisRateLimiter};
