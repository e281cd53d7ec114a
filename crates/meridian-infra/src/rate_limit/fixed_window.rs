//! In-memory fixed-window rate limiter.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use meridian_core::ports::{RateLimitDecision, RateLimitError, RateLimiter};

/// In-memory rate limiter configuration.
#[derive(Debug, Clone)]
pub struct FixedWindowConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
    /// A sweep of expired entries runs once every this many checks.
    pub sweep_every: u64,
}

impl Default for FixedWindowConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
            sweep_every: 100,
        }
    }
}

impl FixedWindowConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
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
            sweep_every: std::env::var("RATE_LIMIT_SWEEP_EVERY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sweep_every),
        }
    }
}

struct WindowEntry {
    count: u32,
    expires_at: Instant,
}

struct WindowState {
    entries: HashMap<String, WindowEntry>,
    checks_since_sweep: u64,
}

/// Fixed-window rate limiter keyed by client identifier.
///
/// Each key gets a counter and a window expiry. The first request from a key
/// (or the first after its window lapsed) opens a fresh window; requests
/// beyond `max_requests` within one window are denied without being counted.
/// Limits are per-process, not distributed across instances - use the Redis
/// backend when running more than one replica.
///
/// Expired entries are dropped by a sweep that runs every `sweep_every`
/// checks; until swept or re-accessed, a lapsed entry may linger. The sweep
/// never touches an entry whose window is still open.
pub struct FixedWindowRateLimiter {
    config: FixedWindowConfig,
    state: Mutex<WindowState>,
}

impl FixedWindowRateLimiter {
    pub fn new(config: FixedWindowConfig) -> Self {
        let config = FixedWindowConfig {
            max_requests: config.max_requests.max(1),
            sweep_every: config.sweep_every.max(1),
            ..config
        };
        Self {
            config,
            state: Mutex::new(WindowState {
                entries: HashMap::new(),
                checks_since_sweep: 0,
            }),
        }
    }

    pub fn from_env() -> Self {
        Self::new(FixedWindowConfig::from_env())
    }

    /// Check a key against its window. Total: every call yields a decision.
    ///
    /// The async [`RateLimiter`] impl delegates here; the limiter itself
    /// never suspends.
    pub fn check_key(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        state.checks_since_sweep += 1;
        if state.checks_since_sweep >= self.config.sweep_every {
            state.checks_since_sweep = 0;
            state.entries.retain(|_, entry| entry.expires_at > now);
        }

        let max = self.config.max_requests;
        match state.entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                if entry.count < max {
                    entry.count += 1;
                    RateLimitDecision {
                        allowed: true,
                        remaining: max - entry.count,
                        reset_after: entry.expires_at - now,
                    }
                } else {
                    // Over the limit: denied and not counted.
                    RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_after: entry.expires_at - now,
                    }
                }
            }
            _ => {
                // No entry, or the window lapsed: open a fresh one.
                state.entries.insert(
                    key.to_string(),
                    WindowEntry {
                        count: 1,
                        expires_at: now + self.config.window,
                    },
                );
                RateLimitDecision {
                    allowed: true,
                    remaining: max - 1,
                    reset_after: self.config.window,
                }
            }
        }
    }

    /// Drop every entry whose window has lapsed.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of identifiers currently tracked, lapsed windows included.
    pub fn tracked(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

#[async_trait]
impl RateLimiter for FixedWindowRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitDecision, RateLimitError> {
        Ok(self.check_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window: Duration) -> FixedWindowRateLimiter {
        FixedWindowRateLimiter::new(FixedWindowConfig {
            max_requests,
            window,
            sweep_every: 100,
        })
    }

    #[test]
    fn six_calls_against_a_window_of_five() {
        let limiter = limiter(5, Duration::from_secs(60));

        let decisions: Vec<_> = (0..6).map(|_| limiter.check_key("1.2.3.4")).collect();

        let allowed: Vec<_> = decisions.iter().map(|d| d.allowed).collect();
        let remaining: Vec<_> = decisions.iter().map(|d| d.remaining).collect();
        assert_eq!(allowed, [true, true, true, true, true, false]);
        assert_eq!(remaining, [4, 3, 2, 1, 0, 0]);
    }

    #[test]
    fn denied_requests_are_not_counted() {
        let limiter = limiter(2, Duration::from_secs(60));
        limiter.check_key("k");
        limiter.check_key("k");

        // Repeated denials keep reporting the same state.
        for _ in 0..3 {
            let d = limiter.check_key("k");
            assert!(!d.allowed);
            assert_eq!(d.remaining, 0);
        }
    }

    #[test]
    fn keys_are_independent() {
        let limiter = limiter(1, Duration::from_secs(60));
        assert!(limiter.check_key("a").allowed);
        assert!(!limiter.check_key("a").allowed);
        assert!(limiter.check_key("b").allowed);
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = limiter(2, Duration::from_millis(50));
        limiter.check_key("k");
        limiter.check_key("k");
        assert!(!limiter.check_key("k").allowed);

        std::thread::sleep(Duration::from_millis(80));

        let d = limiter.check_key("k");
        assert!(d.allowed);
        assert_eq!(d.remaining, 1);
    }

    #[test]
    fn reset_after_never_exceeds_the_window() {
        let limiter = limiter(3, Duration::from_secs(60));
        let d = limiter.check_key("k");
        assert!(d.reset_after <= Duration::from_secs(60));
        let d = limiter.check_key("k");
        assert!(d.reset_after <= Duration::from_secs(60));
    }

    #[test]
    fn sweep_keeps_live_entries() {
        let limiter = limiter(5, Duration::from_secs(60));
        limiter.check_key("a");
        limiter.check_key("b");
        limiter.check_key("c");

        limiter.sweep();
        assert_eq!(limiter.tracked(), 3);
    }

    #[test]
    fn sweep_drops_lapsed_entries() {
        let limiter = limiter(5, Duration::from_millis(20));
        limiter.check_key("a");
        limiter.check_key("b");

        std::thread::sleep(Duration::from_millis(40));
        limiter.check_key("c");
        assert_eq!(limiter.tracked(), 3);

        limiter.sweep();
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn periodic_sweep_triggers_on_schedule() {
        let limiter = FixedWindowRateLimiter::new(FixedWindowConfig {
            max_requests: 5,
            window: Duration::from_millis(20),
            sweep_every: 4,
        });
        limiter.check_key("a");
        limiter.check_key("b");
        std::thread::sleep(Duration::from_millis(40));

        // Third check does not sweep yet; the fourth does and also counts
        // itself, leaving only the fresh keys.
        limiter.check_key("c");
        assert_eq!(limiter.tracked(), 3);
        limiter.check_key("d");
        assert_eq!(limiter.tracked(), 2);
    }

    #[tokio::test]
    async fn port_check_is_total() {
        let limiter = limiter(1, Duration::from_secs(60));
        let dyn_limiter: &dyn RateLimiter = &limiter;

        let d = dyn_limiter.check("k").await.unwrap();
        assert!(d.allowed);
        let d = dyn_limiter.check("k").await.unwrap();
        assert!(!d.allowed);
    }

    #[test]
    fn concurrent_checks_lose_no_updates() {
        use std::sync::Arc;

        let limiter = Arc::new(limiter(1000, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        limiter.check_key("shared");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let d = limiter.check_key("shared");
        assert_eq!(d.remaining, 1000 - 801);
    }
}
