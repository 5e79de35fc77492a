//! Cache capacities and lifetimes

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Per-cache sizing. Every cache is bounded; TTLs are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CachesConfig {
    /// Resolved site configs held per instance
    /// Env: WR_CONFIG_CACHE_CAPACITY
    /// Default: 10
    pub config_capacity: usize,

    /// Backend API responses
    /// Env: WR_API_CACHE_CAPACITY
    /// Default: 500
    pub api_capacity: usize,

    /// Env: WR_API_CACHE_TTL
    /// Default: 60
    pub api_ttl_secs: u64,

    /// Env: WR_BLACKLIST_CAPACITY
    /// Default: 500
    pub blacklist_capacity: usize,

    /// Env: WR_RATE_LIMIT_CAPACITY
    /// Default: 1000
    pub rate_limit_capacity: usize,

    /// Env: WR_BLACKHOLE_CAPACITY
    /// Default: 5000
    pub blackhole_capacity: usize,

    /// Decoy identities, active and retired
    /// Env: WR_SACRIFICE_CAPACITY
    /// Default: 50
    pub sacrifice_capacity: usize,

    /// Spoofed metadata per (domain, path, minute)
    /// Env: WR_CLOAK_CACHE_CAPACITY
    /// Default: 500
    pub cloak_capacity: usize,

    /// Env: WR_CLOAK_CACHE_TTL
    /// Default: 60
    pub cloak_ttl_secs: u64,

    /// Remote site overrides, one per domain
    /// Env: WR_OVERRIDES_CAPACITY
    /// Default: 10
    pub overrides_capacity: usize,

    /// Deduplicated error reports
    /// Env: WR_ERROR_LOG_CAPACITY
    /// Default: 500
    pub error_log_capacity: usize,

    /// Window during which the same error is reported once
    /// Env: WR_ERROR_LOG_TTL
    /// Default: 60
    pub error_log_ttl_secs: u64,

    /// Hostname suffixes that are never cached by the config resolver
    /// Env: WR_PREVIEW_SUFFIXES (comma-separated)
    /// Default: [".pages.dev", ".workers.dev"]
    pub preview_host_suffixes: Vec<String>,
}

impl Default for CachesConfig {
    fn default() -> Self {
        Self {
            config_capacity: 10,
            api_capacity: 500,
            api_ttl_secs: 60,
            blacklist_capacity: 500,
            rate_limit_capacity: 1000,
            blackhole_capacity: 5000,
            sacrifice_capacity: 50,
            cloak_capacity: 500,
            cloak_ttl_secs: 60,
            overrides_capacity: 10,
            error_log_capacity: 500,
            error_log_ttl_secs: 60,
            preview_host_suffixes: vec![".pages.dev".to_string(), ".workers.dev".to_string()],
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, slot: &mut T) {
    if let Ok(v) = env::var(name) {
        if let Ok(parsed) = v.parse() {
            *slot = parsed;
        }
    }
}

impl CachesConfig {
    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    /// Apply environment variables
    pub fn apply_env_vars(&mut self) {
        env_parse("WR_CONFIG_CACHE_CAPACITY", &mut self.config_capacity);
        env_parse("WR_API_CACHE_CAPACITY", &mut self.api_capacity);
        env_parse("WR_API_CACHE_TTL", &mut self.api_ttl_secs);
        env_parse("WR_BLACKLIST_CAPACITY", &mut self.blacklist_capacity);
        env_parse("WR_RATE_LIMIT_CAPACITY", &mut self.rate_limit_capacity);
        env_parse("WR_BLACKHOLE_CAPACITY", &mut self.blackhole_capacity);
        env_parse("WR_SACRIFICE_CAPACITY", &mut self.sacrifice_capacity);
        env_parse("WR_CLOAK_CACHE_CAPACITY", &mut self.cloak_capacity);
        env_parse("WR_CLOAK_CACHE_TTL", &mut self.cloak_ttl_secs);
        env_parse("WR_OVERRIDES_CAPACITY", &mut self.overrides_capacity);
        env_parse("WR_ERROR_LOG_CAPACITY", &mut self.error_log_capacity);
        env_parse("WR_ERROR_LOG_TTL", &mut self.error_log_ttl_secs);

        if let Ok(v) = env::var("WR_PREVIEW_SUFFIXES") {
            self.preview_host_suffixes =
                v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let capacities = [
            ("config_capacity", self.config_capacity),
            ("api_capacity", self.api_capacity),
            ("blacklist_capacity", self.blacklist_capacity),
            ("rate_limit_capacity", self.rate_limit_capacity),
            ("blackhole_capacity", self.blackhole_capacity),
            ("sacrifice_capacity", self.sacrifice_capacity),
            ("cloak_capacity", self.cloak_capacity),
            ("overrides_capacity", self.overrides_capacity),
            ("error_log_capacity", self.error_log_capacity),
        ];
        for (name, value) in capacities {
            if value == 0 {
                bail!("Invalid {}: capacity must be at least 1", name);
            }
        }
        if self.api_ttl_secs == 0 || self.cloak_ttl_secs == 0 || self.error_log_ttl_secs == 0 {
            bail!("Invalid cache TTL: must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_instance_budget() {
        let cfg = CachesConfig::default();
        assert_eq!(cfg.rate_limit_capacity, 1000);
        assert_eq!(cfg.blackhole_capacity, 5000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let cfg = CachesConfig { sacrifice_capacity: 0, ..Default::default() };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("sacrifice_capacity"));
    }

    #[test]
    fn preview_suffixes_from_env() {
        let mut cfg = CachesConfig::default();
        std::env::set_var("WR_PREVIEW_SUFFIXES", ".preview.local, .staging.example");
        cfg.apply_env_vars();
        std::env::remove_var("WR_PREVIEW_SUFFIXES");
        assert_eq!(cfg.preview_host_suffixes, vec![".preview.local", ".staging.example"]);
    }
}
