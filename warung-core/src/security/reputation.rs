//! Honeypot-driven IP blacklist

use std::sync::Mutex;
use std::time::Duration;

use crate::cache::{Cache, LruCache};
use crate::clock::SharedClock;

/// Addresses that touched the honeypot, remembered for a retention period.
///
/// Entries are kept in a bounded LRU; an entry older than the retention
/// period is treated as absent even while it is still held.
#[derive(Debug)]
pub struct Blacklist {
    flagged: Mutex<LruCache<String, u64>>,
    retention_ms: u64,
    clock: SharedClock,
}

impl Blacklist {
    pub fn new(capacity: usize, retention: Duration, clock: SharedClock) -> Self {
        Self {
            flagged: Mutex::new(LruCache::new(capacity)),
            retention_ms: retention.as_millis() as u64,
            clock,
        }
    }

    /// Flag `ip` as of now. Flagging again restarts its retention.
    pub fn flag(&self, ip: &str) {
        let now = self.clock.now_millis();
        let mut flagged = self.flagged.lock().unwrap_or_else(|e| e.into_inner());
        flagged.insert(ip.to_string(), now);
        log::info!("blacklisted {}", ip);
    }

    pub fn is_blacklisted(&self, ip: &str) -> bool {
        let now = self.clock.now_millis();
        let mut flagged = self.flagged.lock().unwrap_or_else(|e| e.into_inner());
        match flagged.get(&ip.to_string()) {
            Some(at) => now.saturating_sub(*at) < self.retention_ms,
            None => false,
        }
    }

    /// Entries physically held, expired or not
    pub fn len(&self) -> usize {
        self.flagged.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn flagged_until_retention_elapses() {
        let clock = ManualClock::starting_at(0);
        let list = Blacklist::new(500, Duration::from_secs(300), clock.clone());
        assert!(!list.is_blacklisted("9.9.9.9"));

        list.flag("9.9.9.9");
        clock.advance(Duration::from_millis(299_999));
        assert!(list.is_blacklisted("9.9.9.9"));

        clock.advance(Duration::from_millis(1));
        assert!(!list.is_blacklisted("9.9.9.9"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn flag_is_idempotent() {
        let clock = ManualClock::starting_at(0);
        let list = Blacklist::new(500, Duration::from_secs(300), clock);
        list.flag("1.1.1.1");
        list.flag("1.1.1.1");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn capacity_bounds_memory() {
        let clock = ManualClock::starting_at(0);
        let list = Blacklist::new(2, Duration::from_secs(300), clock);
        list.flag("a");
        list.flag("b");
        list.flag("c");
        assert_eq!(list.len(), 2);
        assert!(!list.is_blacklisted("a"));
    }
}
