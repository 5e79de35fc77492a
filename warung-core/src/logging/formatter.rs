//! Line formats

use serde_json::Value;

use super::entry::LogEntry;

/// How a log line is rendered
#[derive(Clone, Debug, PartialEq)]
pub enum LogFormat {
    /// `{"timestamp":"...","level":"INFO","target":"...","message":"...",...}`
    Json,
    /// `2026-01-15 10:30:00.000 INFO  [warung::gate] throttled ip=10.0.0.1`
    Human,
    /// `timestamp=... level=INFO target=... message="..." ip="10.0.0.1"`
    Logfmt,
}

impl LogFormat {
    pub fn format_entry(&self, entry: &LogEntry) -> String {
        match self {
            LogFormat::Json => format_json(entry),
            LogFormat::Human => format_human(entry),
            LogFormat::Logfmt => format_logfmt(entry),
        }
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

fn format_json(entry: &LogEntry) -> String {
    let mut json = serde_json::Map::new();
    json.insert("timestamp".into(), Value::String(entry.timestamp.to_rfc3339()));
    json.insert("level".into(), Value::String(entry.level.as_str().to_string()));
    json.insert("target".into(), Value::String(entry.target.clone()));
    json.insert("message".into(), Value::String(entry.message.clone()));

    if let Some(id) = &entry.correlation_id {
        json.insert("request_id".into(), Value::String(id.clone()));
    }
    if let Some(location) = &entry.location {
        json.insert("location".into(), Value::String(location.clone()));
    }
    for (key, value) in &entry.fields {
        json.insert(key.clone(), value.clone());
    }

    serde_json::to_string(&json).unwrap_or_else(|_| entry.message.clone())
}

fn format_human(entry: &LogEntry) -> String {
    let mut line = format!(
        "{} {:5} [{}] {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        entry.level.as_str(),
        entry.target,
        entry.message
    );
    if let Some(id) = &entry.correlation_id {
        line.push_str(&format!(" request_id={}", id));
    }
    for (key, value) in &entry.fields {
        line.push_str(&format!(" {}={}", key, plain(value)));
    }
    if let Some(location) = &entry.location {
        line.push_str(&format!(" ({})", location));
    }
    line
}

fn format_logfmt(entry: &LogEntry) -> String {
    let mut parts = vec![
        format!("timestamp={}", entry.timestamp.to_rfc3339()),
        format!("level={}", entry.level.as_str()),
        format!("target={}", entry.target),
        format!("message={}", quoted(&entry.message)),
    ];
    if let Some(id) = &entry.correlation_id {
        parts.push(format!("request_id={}", id));
    }
    for (key, value) in &entry.fields {
        let rendered = match value {
            Value::Number(_) | Value::Bool(_) => value.to_string(),
            other => quoted(&plain(other)),
        };
        parts.push(format!("{}={}", key, rendered));
    }
    if let Some(location) = &entry.location {
        parts.push(format!("location={}", quoted(location)));
    }
    parts.join(" ")
}
