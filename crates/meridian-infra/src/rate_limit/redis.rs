//! Redis-backed fixed-window rate limiter for multi-instance deployments.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};

use meridian_core::ports::{RateLimitDecision, RateLimitError, RateLimiter};

/// Redis rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RedisRateLimitConfig {
    /// Redis connection URL.
    pub url: String,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
    /// Key prefix for rate limit keys.
    pub key_prefix: String,
}

impl Default for RedisRateLimitConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(2),
            max_requests: 10,
            window: Duration::from_secs(60),
            key_prefix: "meridian:ratelimit".to_string(),
        }
    }
}

impl RedisRateLimitConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout: defaults.connect_timeout,
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_requests),
            window: Duration::from_secs(
                std::env::var("RATE_LIMIT_WINDOW_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.window.as_secs()),
            ),
            key_prefix: std::env::var("RATE_LIMIT_KEY_PREFIX").unwrap_or(defaults.key_prefix),
        }
    }
}

/// Redis-backed fixed-window rate limiter.
///
/// Windows live in Redis with a TTL equal to the window, so expiry and
/// cleanup are Redis's problem. The count-and-expire step runs as one Lua
/// script, keeping increments atomic across server instances.
pub struct RedisRateLimiter {
    conn: ConnectionManager,
    config: RedisRateLimitConfig,
    /// Lua script for atomic increment with expiry.
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(config: RedisRateLimitConfig) -> Result<Self, RateLimitError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client);
        let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| RateLimitError::Backend("Connection timed out".to_string()))?
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        // Returns: [count_after_increment, ttl_remaining]. Denied requests
        // are decremented back so they are not counted against the window.
        let script = Script::new(
            r#"
            local key = KEYS[1]
            local max_requests = tonumber(ARGV[1])
            local window_secs = tonumber(ARGV[2])

            local current = redis.call('INCR', key)
            if current == 1 then
                redis.call('EXPIRE', key, window_secs)
            end
            if current > max_requests then
                redis.call('DECR', key)
            end

            local ttl = redis.call('TTL', key)
            return {current, ttl}
            "#,
        );

        tracing::info!(url = %config.url, "Connected to Redis rate limiter");

        Ok(Self {
            conn,
            config,
            script,
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, RateLimitError> {
        Self::new(RedisRateLimitConfig::from_env()).await
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitDecision, RateLimitError> {
        let redis_key = self.make_key(key);
        let mut conn = self.conn.clone();

        let result: Vec<i64> = self
            .script
            .key(&redis_key)
            .arg(self.config.max_requests)
            .arg(self.config.window.as_secs())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let count = result.first().copied().unwrap_or(1) as u32;
        let ttl_secs = result.get(1).copied().unwrap_or(1).max(1) as u64;

        let allowed = count <= self.config.max_requests;
        let remaining = if allowed {
            self.config.max_requests.saturating_sub(count)
        } else {
            0
        };

        Ok(RateLimitDecision {
            allowed,
            remaining,
            reset_after: Duration::from_secs(ttl_secs),
        })
    }
}
