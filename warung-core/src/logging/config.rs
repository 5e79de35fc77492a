//! Runtime logger settings

use std::collections::BTreeMap;

use super::LogFormat;

/// Where formatted lines are written
#[derive(Clone, Debug, PartialEq)]
pub enum LogOutput {
    Stdout {
        /// Overrides [`LoggingConfig::format`] for this output
        format: Option<LogFormat>,
    },
    Stderr {
        /// Overrides [`LoggingConfig::format`] for this output
        format: Option<LogFormat>,
    },
}

impl LogOutput {
    /// Format this output writes with
    pub fn effective_format<'a>(&'a self, default: &'a LogFormat) -> &'a LogFormat {
        match self {
            LogOutput::Stdout { format } | LogOutput::Stderr { format } => {
                format.as_ref().unwrap_or(default)
            }
        }
    }
}

/// Logger settings, built once at startup
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Minimum level written
    pub level: LogLevel,
    pub outputs: Vec<LogOutput>,
    /// Default format for outputs that do not pick their own
    pub format: LogFormat,
    /// Attach source file and line to each entry
    pub with_location: bool,
    /// Fields stamped on every entry
    pub context_fields: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            outputs: vec![LogOutput::Stdout { format: None }],
            format: LogFormat::Human,
            with_location: false,
            context_fields: BTreeMap::new(),
        }
    }
}

/// Severity, most severe first
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug => LogLevel::Debug,
            log::Level::Trace => LogLevel::Trace,
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl LoggingConfig {
    /// JSON lines on stdout at info
    pub fn production() -> Self {
        Self {
            level: LogLevel::Info,
            outputs: vec![LogOutput::Stdout { format: Some(LogFormat::Json) }],
            format: LogFormat::Json,
            with_location: false,
            context_fields: BTreeMap::new(),
        }
    }

    /// Human-readable lines on stderr at debug, with source locations
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            outputs: vec![LogOutput::Stderr { format: Some(LogFormat::Human) }],
            format: LogFormat::Human,
            with_location: true,
            context_fields: BTreeMap::new(),
        }
    }

    pub fn with_context_field(mut self, key: &str, value: &str) -> Self {
        self.context_fields.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_stderr(mut self, format: LogFormat) -> Self {
        self.outputs.push(LogOutput::Stderr { format: Some(format) });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_writes_json() {
        let config = LoggingConfig::production();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.outputs[0].effective_format(&config.format), &LogFormat::Json);
    }

    #[test]
    fn output_falls_back_to_default_format() {
        let config = LoggingConfig::default().with_level(LogLevel::Trace);
        assert_eq!(config.outputs[0].effective_format(&LogFormat::Logfmt), &LogFormat::Logfmt);
        assert!(LogLevel::Error < LogLevel::Trace);
    }

    #[test]
    fn builder_adds_fields_and_outputs() {
        let config = LoggingConfig::development()
            .with_context_field("service", "warung")
            .with_stderr(LogFormat::Json);
        assert_eq!(config.outputs.len(), 2);
        assert_eq!(config.context_fields.get("service").map(String::as_str), Some("warung"));
    }
}
