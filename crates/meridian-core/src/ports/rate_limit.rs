//! Rate limiting port.

use async_trait::async_trait;
use std::time::Duration;

/// Rate limiter trait - abstraction over rate limiting backends.
///
/// A check both decides and records: an allowed request is counted against
/// the caller's window, a denied one is not.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check whether a request from `key` may proceed.
    async fn check(&self, key: &str) -> Result<RateLimitDecision, RateLimitError>;
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Time until the current window expires. HTTP callers derive
    /// `Retry-After` from this on denial.
    pub reset_after: Duration,
}

/// Rate limit errors.
///
/// The in-memory backend is total and never returns these; only remote
/// backends can fail. Callers are expected to fail open.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
