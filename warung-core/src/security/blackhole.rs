//! Progressive punishment for scraper-like clients

use rand::Rng;
use std::sync::Mutex;

use super::decoy::blackhole_page;
use crate::cache::{Cache, LruCache};

/// Counts requests from scraper-like clients; past the threshold every
/// request gets the decoy page instead of content
#[derive(Debug)]
pub struct Blackhole {
    enabled: bool,
    threshold: u32,
    counts: Mutex<LruCache<String, u32>>,
}

impl Blackhole {
    pub fn new(enabled: bool, threshold: u32, capacity: usize) -> Self {
        Self { enabled, threshold, counts: Mutex::new(LruCache::new(capacity)) }
    }

    /// Record one request. Returns the decoy page once the client's count
    /// exceeds the threshold. Disabled or ordinary clients are not counted.
    pub fn capture(&self, ip: &str, scraper_like: bool) -> Option<String> {
        if !self.enabled || !scraper_like {
            return None;
        }
        let count = {
            let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
            let next = counts.get(&ip.to_string()).copied().unwrap_or(0).saturating_add(1);
            counts.insert(ip.to_string(), next);
            next
        };
        if count <= self.threshold {
            return None;
        }
        if count == self.threshold + 1 {
            log::info!("{} entered the blackhole after {} requests", ip, self.threshold);
        }
        Some(blackhole_page(rand::thread_rng().gen_range(0..1000)))
    }

    pub fn count_for(&self, ip: &str) -> u32 {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.peek(&ip.to_string()).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoy_only_after_threshold() {
        let hole = Blackhole::new(true, 50, 5000);
        for _ in 0..50 {
            assert!(hole.capture("6.6.6.6", true).is_none());
        }
        let page = hole.capture("6.6.6.6", true).expect("decoy after threshold");
        assert!(page.contains("Loading Timeline"));
        assert!(hole.capture("6.6.6.6", true).is_some());
        assert_eq!(hole.count_for("6.6.6.6"), 52);
    }

    #[test]
    fn ordinary_clients_are_not_counted() {
        let hole = Blackhole::new(true, 0, 10);
        assert!(hole.capture("1.1.1.1", false).is_none());
        assert_eq!(hole.count_for("1.1.1.1"), 0);
    }

    #[test]
    fn disabled_blackhole_never_counts() {
        let hole = Blackhole::new(false, 0, 10);
        assert!(hole.capture("1.1.1.1", true).is_none());
        assert_eq!(hole.count_for("1.1.1.1"), 0);
    }
}
