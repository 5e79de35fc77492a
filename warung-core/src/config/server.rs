//! Edge server configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Server listening port
    /// Env: WR_PORT
    /// Default: 8080
    pub port: u16,

    /// Server listening address
    /// Env: WR_HOST
    /// Default: "127.0.0.1"
    pub host: String,

    /// Header carrying the real client address set by the fronting proxy
    /// Env: WR_CLIENT_IP_HEADER
    /// Default: "cf-connecting-ip"
    pub client_ip_header: String,

    /// Seconds to wait for background tasks on shutdown
    /// Env: WR_SHUTDOWN_GRACE
    /// Default: 5
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            client_ip_header: "cf-connecting-ip".to_string(),
            shutdown_grace_secs: 5,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.port = other.port;
        self.host = other.host;
        self.client_ip_header = other.client_ip_header;
        self.shutdown_grace_secs = other.shutdown_grace_secs;
    }

    /// Apply environment variables
    pub fn apply_env_vars(&mut self) {
        if let Ok(port) = env::var("WR_PORT") {
            if let Ok(p) = port.parse() {
                self.port = p;
            }
        }

        if let Ok(host) = env::var("WR_HOST") {
            self.host = host;
        }

        if let Ok(header) = env::var("WR_CLIENT_IP_HEADER") {
            self.client_ip_header = header.to_ascii_lowercase();
        }

        if let Ok(grace) = env::var("WR_SHUTDOWN_GRACE") {
            if let Ok(g) = grace.parse() {
                self.shutdown_grace_secs = g;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("Invalid port: port must be between 1 and 65535");
        }

        if self.host.is_empty() {
            bail!("Invalid host: host cannot be empty");
        }

        if http::HeaderName::from_bytes(self.client_ip_header.as_bytes()).is_err() {
            bail!("Invalid client_ip_header: '{}' is not a header name", self.client_ip_header);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8080");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_header_name_fails() {
        let cfg = ServerConfig { client_ip_header: "bad header".to_string(), ..Default::default() };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("client_ip_header"));
    }

    #[test]
    fn test_apply_env_vars_port() {
        let mut cfg = ServerConfig::default();
        std::env::set_var("WR_PORT", "9090");
        cfg.apply_env_vars();
        std::env::remove_var("WR_PORT");
        assert_eq!(cfg.port, 9090);
    }
}
