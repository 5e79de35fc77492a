//! Fixed-window request counting per client

use std::sync::Mutex;

use crate::cache::{Cache, LruCache};
use crate::clock::SharedClock;
use crate::config::ShieldConfig;
use crate::error::Throttled;

/// Window limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window_secs: u64,
    pub max_requests: u32,
    /// Ceiling for known scrapers; never above `max_requests`
    pub scraper_max_requests: u32,
}

impl From<&ShieldConfig> for RateLimitPolicy {
    fn from(cfg: &ShieldConfig) -> Self {
        Self {
            window_secs: cfg.rate_limit_window_secs,
            max_requests: cfg.rate_limit_max,
            scraper_max_requests: cfg.scraper_rate_max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RateLimitWindow {
    count: u32,
    /// Epoch seconds
    window_start: u64,
}

/// Per-client fixed-window limiter.
///
/// A window is live while `now - window_start < window_secs`. A rejected
/// request does not bump the stored count, so a throttled client is
/// readmitted as soon as its window restarts.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<LruCache<String, RateLimitWindow>>,
    policy: RateLimitPolicy,
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy, capacity: usize, clock: SharedClock) -> Self {
        Self { windows: Mutex::new(LruCache::new(capacity)), policy, clock }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Count one request from `client_id`
    pub fn check(&self, client_id: &str, is_scraper: bool) -> Result<(), Throttled> {
        let limit =
            if is_scraper { self.policy.scraper_max_requests } else { self.policy.max_requests };
        let now = self.clock.now_secs();
        let window = self.policy.window_secs;

        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let key = client_id.to_string();

        if let Some(current) = windows.get(&key).copied() {
            let elapsed = now.saturating_sub(current.window_start);
            if elapsed < window {
                let next = current.count + 1;
                if next > limit {
                    let retry_after_secs = window - elapsed;
                    log::debug!("rate limit hit for {} ({} > {})", client_id, next, limit);
                    return Err(Throttled { retry_after_secs });
                }
                windows.insert(key, RateLimitWindow { count: next, window_start: current.window_start });
                return Ok(());
            }
        }

        windows.insert(key, RateLimitWindow { count: 1, window_start: now });
        Ok(())
    }

    /// Requests counted in the client's live window
    pub fn count_for(&self, client_id: &str) -> u32 {
        let now = self.clock.now_secs();
        let windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        windows
            .peek(&client_id.to_string())
            .filter(|w| now.saturating_sub(w.window_start) < self.policy.window_secs)
            .map(|w| w.count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;
    use std::time::Duration;

    fn limiter() -> (RateLimiter, Arc<ManualClock>) {
        let clock = ManualClock::starting_at(1_700_000_000_000);
        let policy = RateLimitPolicy { window_secs: 60, max_requests: 120, scraper_max_requests: 10 };
        (RateLimiter::new(policy, 1000, clock.clone()), clock)
    }

    #[test]
    fn allows_exactly_the_limit() {
        let (limiter, _clock) = limiter();
        for _ in 0..120 {
            assert!(limiter.check("1.2.3.4", false).is_ok());
        }
        let err = limiter.check("1.2.3.4", false).unwrap_err();
        assert_eq!(err.retry_after_secs, 60);
        assert_eq!(limiter.count_for("1.2.3.4"), 120);
    }

    #[test]
    fn retry_after_shrinks_as_window_ages() {
        let (limiter, clock) = limiter();
        for _ in 0..120 {
            limiter.check("a", false).unwrap();
        }
        clock.advance(Duration::from_secs(45));
        assert_eq!(limiter.check("a", false).unwrap_err().retry_after_secs, 15);
    }

    #[test]
    fn scrapers_get_the_lower_ceiling() {
        let (limiter, _clock) = limiter();
        for _ in 0..10 {
            assert!(limiter.check("bot", true).is_ok());
        }
        assert!(limiter.check("bot", true).is_err());
    }

    #[test]
    fn window_restarts_after_expiry() {
        let (limiter, clock) = limiter();
        for _ in 0..120 {
            limiter.check("a", false).unwrap();
        }
        assert!(limiter.check("a", false).is_err());

        clock.advance(Duration::from_secs(60));
        assert!(limiter.check("a", false).is_ok());
        assert_eq!(limiter.count_for("a"), 1);
    }

    #[test]
    fn clients_are_independent() {
        let (limiter, _clock) = limiter();
        for _ in 0..10 {
            limiter.check("x", true).unwrap();
        }
        assert!(limiter.check("x", true).is_err());
        assert!(limiter.check("y", true).is_ok());
    }
}
