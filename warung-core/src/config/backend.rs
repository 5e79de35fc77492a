//! Media backend client settings

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Hard bound on every backend call, in seconds
    /// Env: WR_BACKEND_TIMEOUT
    /// Default: 10
    pub timeout_secs: u64,

    /// Product token sent as User-Agent, followed by the site domain
    /// Env: WR_BACKEND_USER_AGENT
    /// Default: "DapurClient/24.0"
    pub user_agent: String,

    /// Backend cache TTL; remote site overrides stay fresh for
    /// min(cache_ttl_secs, 300) seconds
    /// Env: WR_BACKEND_CACHE_TTL
    /// Default: 300
    pub cache_ttl_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { timeout_secs: 10, user_agent: "DapurClient/24.0".to_string(), cache_ttl_secs: 300 }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Freshness window of the remote site-config payload
    pub fn overrides_fresh_for(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs.min(300))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    /// Apply environment variables
    pub fn apply_env_vars(&mut self) {
        if let Ok(v) = env::var("WR_BACKEND_TIMEOUT") {
            if let Ok(n) = v.parse() {
                self.timeout_secs = n;
            }
        }
        if let Ok(v) = env::var("WR_BACKEND_USER_AGENT") {
            self.user_agent = v;
        }
        if let Ok(v) = env::var("WR_BACKEND_CACHE_TTL") {
            if let Ok(n) = v.parse() {
                self.cache_ttl_secs = n;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("Invalid timeout_secs: must be greater than 0");
        }
        if self.user_agent.trim().is_empty() {
            bail!("Invalid user_agent: cannot be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_freshness_is_capped() {
        let cfg = BackendConfig { cache_ttl_secs: 3600, ..Default::default() };
        assert_eq!(cfg.overrides_fresh_for(), Duration::from_secs(300));

        let cfg = BackendConfig { cache_ttl_secs: 30, ..Default::default() };
        assert_eq!(cfg.overrides_fresh_for(), Duration::from_secs(30));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = BackendConfig { timeout_secs: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
