//! Rate limiting implementations.

mod fixed_window;

pub use fixed_window::{FixedWindowConfig, FixedWindowRateLimiter};

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisRateLimitConfig, RedisRateLimiter};
