//! Shield configuration: thresholds and toggles for every countermeasure

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::security::patterns::DEFAULT_SCRAPER_AGENTS;

/// Shield configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShieldConfig {
    /// Fixed rate-limit window in seconds
    /// Env: WR_RATE_LIMIT_WINDOW
    /// Default: 60
    pub rate_limit_window_secs: u64,

    /// Requests allowed per window for ordinary clients
    /// Env: WR_RATE_LIMIT_MAX
    /// Default: 120
    pub rate_limit_max: u32,

    /// Requests allowed per window for known commercial scrapers
    /// Env: WR_SCRAPER_RATE_MAX
    /// Default: 10
    pub scraper_rate_max: u32,

    /// Commercial scraper user-agent substrings (case-sensitive)
    /// Env: WR_SCRAPER_AGENTS (comma-separated)
    pub scraper_agents: Vec<String>,

    /// How long a honeypot hit keeps an IP blacklisted
    /// Env: WR_BLACKLIST_RETENTION
    /// Default: 300
    pub blacklist_retention_secs: u64,

    /// First path segment that marks the honeypot
    /// Env: HONEYPOT_PREFIX (sanitized to [a-z0-9-])
    /// Default: "trap"
    pub honeypot_prefix: String,

    /// Env: WR_BLACKHOLE_ENABLED
    pub blackhole_enabled: bool,

    /// Requests a scraper may make before it only sees the decoy
    /// Env: WR_BLACKHOLE_MAX_REQUESTS
    /// Default: 50
    pub blackhole_max_requests: u32,

    /// Env: WR_SACRIFICE_ENABLED
    pub sacrifice_enabled: bool,

    /// Energy at which a decoy identity is retired
    /// Env: WR_SACRIFICE_ENERGY_MAX
    /// Default: 1000
    pub sacrifice_energy_max: u32,

    /// Energy added per redirect
    /// Env: WR_SACRIFICE_ENERGY_STEP
    /// Default: 10
    pub sacrifice_energy_step: u32,

    /// Metadata spoofing for non-human visitors
    /// Env: WR_DNA_ENABLED
    pub dna_enabled: bool,

    /// CSS keyword encoding for human visitors
    /// Env: WR_CSS_STEGO_ENABLED
    pub css_stego_enabled: bool,

    /// Decoy landing page for headless browsers
    /// Env: WR_FAKE_LANDING_ENABLED
    pub fake_landing_enabled: bool,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            rate_limit_window_secs: 60,
            rate_limit_max: 120,
            scraper_rate_max: 10,
            scraper_agents: DEFAULT_SCRAPER_AGENTS.iter().map(|s| s.to_string()).collect(),
            blacklist_retention_secs: 300,
            honeypot_prefix: "trap".to_string(),
            blackhole_enabled: true,
            blackhole_max_requests: 50,
            sacrifice_enabled: true,
            sacrifice_energy_max: 1000,
            sacrifice_energy_step: 10,
            dna_enabled: true,
            css_stego_enabled: true,
            fake_landing_enabled: true,
        }
    }
}

/// Keep only `[a-z0-9-]` (case-insensitive), as the honeypot segment is
/// compared against lowercased paths
pub fn sanitize_prefix(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '-').collect::<String>().to_lowercase()
}

fn env_flag(name: &str, current: bool) -> bool {
    match env::var(name) {
        Ok(v) => v == "1" || v.eq_ignore_ascii_case("true"),
        Err(_) => current,
    }
}

impl ShieldConfig {
    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    /// Apply environment variables
    pub fn apply_env_vars(&mut self) {
        if let Ok(v) = env::var("WR_RATE_LIMIT_WINDOW") {
            if let Ok(n) = v.parse() {
                self.rate_limit_window_secs = n;
            }
        }
        if let Ok(v) = env::var("WR_RATE_LIMIT_MAX") {
            if let Ok(n) = v.parse() {
                self.rate_limit_max = n;
            }
        }
        if let Ok(v) = env::var("WR_SCRAPER_RATE_MAX") {
            if let Ok(n) = v.parse() {
                self.scraper_rate_max = n;
            }
        }
        if let Ok(v) = env::var("WR_SCRAPER_AGENTS") {
            self.scraper_agents =
                v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = env::var("WR_BLACKLIST_RETENTION") {
            if let Ok(n) = v.parse() {
                self.blacklist_retention_secs = n;
            }
        }
        if let Ok(v) = env::var("HONEYPOT_PREFIX") {
            self.honeypot_prefix = sanitize_prefix(&v);
        }
        if let Ok(v) = env::var("WR_BLACKHOLE_MAX_REQUESTS") {
            if let Ok(n) = v.parse() {
                self.blackhole_max_requests = n;
            }
        }
        if let Ok(v) = env::var("WR_SACRIFICE_ENERGY_MAX") {
            if let Ok(n) = v.parse() {
                self.sacrifice_energy_max = n;
            }
        }
        if let Ok(v) = env::var("WR_SACRIFICE_ENERGY_STEP") {
            if let Ok(n) = v.parse() {
                self.sacrifice_energy_step = n;
            }
        }
        self.blackhole_enabled = env_flag("WR_BLACKHOLE_ENABLED", self.blackhole_enabled);
        self.sacrifice_enabled = env_flag("WR_SACRIFICE_ENABLED", self.sacrifice_enabled);
        self.dna_enabled = env_flag("WR_DNA_ENABLED", self.dna_enabled);
        self.css_stego_enabled = env_flag("WR_CSS_STEGO_ENABLED", self.css_stego_enabled);
        self.fake_landing_enabled = env_flag("WR_FAKE_LANDING_ENABLED", self.fake_landing_enabled);
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit_window_secs == 0 {
            bail!("Invalid rate_limit_window_secs: must be greater than 0");
        }
        if self.rate_limit_max == 0 {
            bail!("Invalid rate_limit_max: must be at least 1");
        }
        if self.scraper_rate_max > self.rate_limit_max {
            bail!("Invalid scraper_rate_max: must not exceed rate_limit_max");
        }
        if self.honeypot_prefix.is_empty() || sanitize_prefix(&self.honeypot_prefix) != self.honeypot_prefix
        {
            bail!("Invalid honeypot_prefix: only lowercase letters, digits and '-' are allowed");
        }
        if self.sacrifice_energy_step == 0 {
            bail!("Invalid sacrifice_energy_step: must be greater than 0");
        }
        if self.sacrifice_energy_max < self.sacrifice_energy_step {
            bail!("Invalid sacrifice_energy_max: must be at least one energy step");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ShieldConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.rate_limit_max, 120);
        assert_eq!(cfg.scraper_rate_max, 10);
        assert!(cfg.scraper_agents.iter().any(|a| a == "AhrefsBot"));
    }

    #[test]
    fn prefix_is_sanitized() {
        assert_eq!(sanitize_prefix("Trap_Zone!/x"), "trapzonex");
        assert_eq!(sanitize_prefix("hp-01"), "hp-01");
    }

    #[test]
    fn scraper_ceiling_above_global_is_rejected() {
        let cfg = ShieldConfig { scraper_rate_max: 500, ..Default::default() };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("scraper_rate_max"));
    }

    #[test]
    fn bad_prefix_is_rejected() {
        let cfg = ShieldConfig { honeypot_prefix: "../x".to_string(), ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
