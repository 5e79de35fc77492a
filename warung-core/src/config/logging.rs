//! Logging configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::logging::{self, LogFormat, LogLevel, LogOutput};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Env: WR_LOG_LEVEL (error, warn, info, debug, trace)
    pub level: String,
    /// Env: WR_LOG_FORMAT (json, human, logfmt)
    pub format: String,
    /// Write to stderr instead of stdout
    /// Env: WR_LOG_STDERR
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "human".to_string(), stderr: false }
    }
}

fn parse_level(raw: &str) -> Option<LogLevel> {
    match raw.to_ascii_lowercase().as_str() {
        "error" => Some(LogLevel::Error),
        "warn" | "warning" => Some(LogLevel::Warn),
        "info" => Some(LogLevel::Info),
        "debug" => Some(LogLevel::Debug),
        "trace" => Some(LogLevel::Trace),
        _ => None,
    }
}

fn parse_format(raw: &str) -> Option<LogFormat> {
    match raw.to_ascii_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "human" | "text" => Some(LogFormat::Human),
        "logfmt" => Some(LogFormat::Logfmt),
        _ => None,
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("WR_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("WR_LOG_FORMAT") {
            self.format = format;
        }
        if let Ok(stderr) = env::var("WR_LOG_STDERR") {
            self.stderr = stderr == "1" || stderr.eq_ignore_ascii_case("true");
        }
    }

    pub fn validate(&self) -> Result<()> {
        if parse_level(&self.level).is_none() {
            bail!("Invalid log level '{}'", self.level);
        }
        if parse_format(&self.format).is_none() {
            bail!("Invalid log format '{}': expected json, human or logfmt", self.format);
        }
        Ok(())
    }

    /// Build the runtime logger settings; unknown values fall back to defaults
    pub fn to_logging_config(&self) -> logging::LoggingConfig {
        let level = parse_level(&self.level).unwrap_or(LogLevel::Info);
        let format = parse_format(&self.format).unwrap_or(LogFormat::Human);
        let output = if self.stderr {
            LogOutput::Stderr { format: None }
        } else {
            LogOutput::Stdout { format: None }
        };
        logging::LoggingConfig {
            level,
            format,
            outputs: vec![output],
            ..logging::LoggingConfig::default()
        }
        .with_context_field("service", "warung")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_runtime_settings() {
        let cfg = LoggingConfig { level: "debug".into(), format: "json".into(), stderr: true };
        let runtime = cfg.to_logging_config();
        assert_eq!(runtime.level, LogLevel::Debug);
        assert_eq!(runtime.format, LogFormat::Json);
        assert_eq!(runtime.outputs, vec![LogOutput::Stderr { format: None }]);
        assert_eq!(runtime.context_fields.get("service").map(String::as_str), Some("warung"));
    }

    #[test]
    fn rejects_unknown_level() {
        let cfg = LoggingConfig { level: "loud".into(), ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
