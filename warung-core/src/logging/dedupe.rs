//! Deduplicated error reporting
//!
//! A failing upstream tends to fail for every request at once. The same
//! (context, message, client ip) triple is written at most once per window.

use std::fmt::Display;
use std::sync::Mutex;
use std::time::Duration;

use crate::cache::{Cache, TtlCache};
use crate::clock::SharedClock;

const MAX_UA_CHARS: usize = 100;

/// Request details attached to a reported error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub ip: String,
    /// At most 100 characters
    pub user_agent: String,
    pub request_id: String,
    pub started_at_ms: u64,
}

impl RequestTag {
    pub fn new(ip: &str, user_agent: &str, request_id: &str, started_at_ms: u64) -> Self {
        Self {
            ip: ip.to_string(),
            user_agent: user_agent.chars().take(MAX_UA_CHARS).collect(),
            request_id: request_id.to_string(),
            started_at_ms,
        }
    }
}

/// Error reporter that drops repeats inside a TTL window
#[derive(Debug)]
pub struct ErrorLog {
    seen: Mutex<TtlCache<String, ()>>,
    clock: SharedClock,
}

impl ErrorLog {
    pub fn new(capacity: usize, window: Duration, clock: SharedClock) -> Self {
        Self { seen: Mutex::new(TtlCache::with_clock(capacity, window, clock.clone())), clock }
    }

    /// Write `err` under `context` unless the same error from the same client
    /// was written within the window. Returns whether a line was written.
    pub fn report(&self, context: &str, err: &dyn Display, tag: Option<&RequestTag>) -> bool {
        let message = err.to_string();
        let ip = tag.map(|t| t.ip.as_str()).unwrap_or("unknown");
        let key = format!("{}:{}:{}", context, message, ip);

        {
            let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
            if seen.contains_key(&key) {
                return false;
            }
            seen.insert(key, ());
        }

        match tag {
            Some(tag) => {
                let duration = self.clock.now_millis().saturating_sub(tag.started_at_ms);
                log::error!(
                    "[{}:{}] {} ip={} ua=\"{}\" duration_ms={}",
                    context,
                    tag.request_id,
                    message,
                    tag.ip,
                    tag.user_agent,
                    duration
                );
            }
            None => log::error!("[{}] {} ip=unknown", context, message),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn tag(ip: &str) -> RequestTag {
        RequestTag::new(ip, "Mozilla/5.0", "ab12cd34", 0)
    }

    #[test]
    fn repeats_are_dropped_within_window() {
        let clock = ManualClock::starting_at(0);
        let log = ErrorLog::new(16, Duration::from_secs(60), clock.clone());

        assert!(log.report("api", &"timeout", Some(&tag("1.1.1.1"))));
        assert!(!log.report("api", &"timeout", Some(&tag("1.1.1.1"))));
        assert!(log.report("api", &"timeout", Some(&tag("2.2.2.2"))));
        assert!(log.report("api", &"reset", Some(&tag("1.1.1.1"))));

        clock.advance(Duration::from_secs(61));
        assert!(log.report("api", &"timeout", Some(&tag("1.1.1.1"))));
    }

    #[test]
    fn user_agent_is_truncated() {
        let long = "x".repeat(250);
        let tag = RequestTag::new("1.1.1.1", &long, "id", 0);
        assert_eq!(tag.user_agent.len(), 100);
    }
}
