//! Configuration system for Warung
//!
//! Every knob of the edge shield lives in one fully enumerated structure with
//! documented defaults. Values are resolved in the following order (highest
//! priority wins):
//!
//! 1. **Environment Variables** - `WR_*` for runtime sections, deployment
//!    names (`WARUNG_DOMAIN`, `DAPUR_API_KEY`, ...) for the site section
//! 2. **Config File** (`warung.toml`) - Override defaults
//! 3. **Defaults** - Lowest priority
//!
//! # Example
//!
//! ```no_run
//! use warung_core::config::WarungConfig;
//!
//! let config = WarungConfig::load()?;
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod backend;
pub mod caches;
pub mod indexing;
pub mod logging;
pub mod server;
pub mod shield;

pub use backend::BackendConfig;
pub use caches::CachesConfig;
pub use indexing::IndexingConfig;
pub use logging::LoggingConfig;
pub use server::ServerConfig;
pub use shield::ShieldConfig;

use crate::site::SiteEnv;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "warung.toml";

/// Complete Warung configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WarungConfig {
    pub server: ServerConfig,
    pub shield: ShieldConfig,
    pub caches: CachesConfig,
    pub backend: BackendConfig,
    pub indexing: IndexingConfig,
    pub logging: LoggingConfig,
    /// Per-deployment site inputs; resolved per request into a `SiteConfig`
    pub site: SiteEnv,
}

impl WarungConfig {
    /// Load configuration with full supersedence chain
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file, then apply the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.server.merge(other.server);
        self.shield.merge(other.shield);
        self.caches.merge(other.caches);
        self.backend.merge(other.backend);
        self.indexing.merge(other.indexing);
        self.logging.merge(other.logging);
        self.site.merge(other.site);
    }

    /// Apply environment variables to configuration
    pub fn apply_env_vars(&mut self) {
        self.server.apply_env_vars();
        self.shield.apply_env_vars();
        self.caches.apply_env_vars();
        self.backend.apply_env_vars();
        self.indexing.apply_env_vars();
        self.logging.apply_env_vars();
        self.site.apply_env_vars();
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate().context("[server]")?;
        self.shield.validate().context("[shield]")?;
        self.caches.validate().context("[caches]")?;
        self.backend.validate().context("[backend]")?;
        self.indexing.validate().context("[indexing]")?;
        self.logging.validate().context("[logging]")?;
        self.site.validate().context("[site]")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = WarungConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.shield.rate_limit_window_secs, 60);
        assert_eq!(config.caches.api_ttl_secs, 60);
        assert_eq!(config.backend.timeout_secs, 10);
        assert!(config.indexing.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warung.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[shield]
rate_limit_max = 200
honeypot_prefix = "hp"

[site]
warung_domain = "example.com"
path_content = "watch"
"#
        )
        .unwrap();

        let config = WarungConfig::from_file(&path).unwrap();
        assert_eq!(config.shield.rate_limit_max, 200);
        assert_eq!(config.shield.honeypot_prefix, "hp");
        assert_eq!(config.shield.scraper_rate_max, 10);
        assert_eq!(config.site.warung_domain.as_deref(), Some("example.com"));
        assert_eq!(config.site.path_content.as_deref(), Some("watch"));
        assert_eq!(config.caches, CachesConfig::default());
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[shield\nrate_limit_max = ").unwrap();

        let err = WarungConfig::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.toml"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = WarungConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.caches.sacrifice_capacity, 50);
    }

    #[test]
    fn test_validation_names_the_section() {
        let mut config = WarungConfig::default();
        config.shield.rate_limit_window_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("[shield]"));
    }
}
