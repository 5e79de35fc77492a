//! One structured log record

use std::collections::BTreeMap;

use super::{LogLevel, LoggingConfig};

/// A log record ready for formatting
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Usually the module path
    pub target: String,
    /// Request id, when the line belongs to a request
    pub correlation_id: Option<String>,
    pub fields: BTreeMap<String, serde_json::Value>,
    /// `file:line`
    pub location: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            level,
            message: message.into(),
            target: target.into(),
            correlation_id: None,
            fields: BTreeMap::new(),
            location: None,
        }
    }

    /// Build from a `log` record, stamping the configured context fields
    pub fn from_record(record: &log::Record, config: &LoggingConfig) -> Self {
        let mut entry =
            Self::new(record.level().into(), record.args().to_string(), record.target());

        if config.with_location {
            if let (Some(file), Some(line)) = (record.file(), record.line()) {
                entry.location = Some(format!("{}:{}", file, line));
            }
        }

        for (key, value) in &config.context_fields {
            entry.fields.insert(key.clone(), serde_json::Value::String(value.clone()));
        }
        entry
    }

    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_accumulate() {
        let entry = LogEntry::new(LogLevel::Warn, "upstream slow", "warung::backend")
            .with_field("status", 503)
            .with_field("ip", "10.0.0.1")
            .with_correlation_id("ab12cd34");

        assert_eq!(entry.fields.len(), 2);
        assert_eq!(entry.fields["status"], serde_json::json!(503));
        assert_eq!(entry.correlation_id.as_deref(), Some("ab12cd34"));
    }
}
