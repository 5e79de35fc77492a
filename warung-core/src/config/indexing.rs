//! IndexNow pinging and keyword landing pages

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_INDEXNOW_ENDPOINTS: &[&str] = &[
    "https://api.indexnow.org/indexnow",
    "https://www.bing.com/indexnow",
    "https://yandex.com/indexnow",
];

/// Indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexingConfig {
    /// Env: WR_INDEXNOW_ENABLED
    /// Default: true
    pub enabled: bool,

    /// Env: WR_INDEXNOW_ENDPOINTS (comma-separated)
    pub endpoints: Vec<String>,

    /// Minimum spacing between scheduled pings, in seconds
    /// Env: WR_INDEXNOW_INTERVAL
    /// Default: 21600 (6 hours)
    pub interval_secs: u64,

    /// URLs per IndexNow submission
    /// Default: 50
    pub batch_size: usize,

    /// Pause between scheduled batches
    /// Default: 500
    pub batch_pause_ms: u64,

    /// A keyword landing hit pings at most once per this many seconds
    /// Default: 60
    pub keyword_ping_dedupe_secs: u64,

    /// A crawler fetching the sitemap pings at most once per this many
    /// seconds per host
    /// Default: 600
    pub sitemap_ping_dedupe_secs: u64,

    /// First path segment of keyword landing pages
    /// Env: LANDING_PATH
    /// Default: "k"
    pub landing_path: String,

    /// Keywords with a landing page
    /// Env: LANDING_KEYWORDS (comma-separated)
    /// Default: none
    pub keywords: Vec<String>,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoints: DEFAULT_INDEXNOW_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            interval_secs: 21_600,
            batch_size: 50,
            batch_pause_ms: 500,
            keyword_ping_dedupe_secs: 60,
            sitemap_ping_dedupe_secs: 600,
            landing_path: "k".to_string(),
            keywords: Vec::new(),
        }
    }
}

impl IndexingConfig {
    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    /// Apply environment variables
    pub fn apply_env_vars(&mut self) {
        if let Ok(enabled) = env::var("WR_INDEXNOW_ENABLED") {
            self.enabled = enabled == "1" || enabled.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = env::var("WR_INDEXNOW_ENDPOINTS") {
            self.endpoints =
                v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = env::var("WR_INDEXNOW_INTERVAL") {
            if let Ok(n) = v.parse() {
                self.interval_secs = n;
            }
        }
        if let Ok(v) = env::var("LANDING_PATH") {
            let v = v.trim().trim_matches('/').to_string();
            if !v.is_empty() {
                self.landing_path = v;
            }
        }
        if let Ok(v) = env::var("LANDING_KEYWORDS") {
            self.keywords =
                v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.endpoints.is_empty() {
            bail!("Invalid endpoints: at least one IndexNow endpoint is required when enabled");
        }
        if self.batch_size == 0 || self.batch_size > 10_000 {
            bail!("Invalid batch_size: must be between 1 and 10000");
        }
        if self.landing_path.is_empty() || self.landing_path.contains('/') {
            bail!("Invalid landing_path: must be a single path segment");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_ping_three_endpoints_every_six_hours() {
        let cfg = IndexingConfig::default();
        assert_eq!(cfg.endpoints.len(), 3);
        assert_eq!(cfg.interval_secs, 6 * 3600);
        assert!(cfg.keywords.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn nested_landing_path_is_rejected() {
        let cfg = IndexingConfig { landing_path: "a/b".to_string(), ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
