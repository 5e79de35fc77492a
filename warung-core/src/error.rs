//! Error types shared across the edge shield

/// A request was rejected by the rate limiter
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("too many requests, retry in {retry_after_secs}s")]
pub struct Throttled {
    /// Seconds until the caller's window restarts (1..=window)
    pub retry_after_secs: u64,
}

/// Any failure talking to the media backend or an indexing endpoint.
///
/// These never reach the page layer: the backend client turns them into a
/// structured error payload.
#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("upstream answered HTTP {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Decode(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl UpstreamError {
    /// HTTP status carried by the error, 0 when there was no response
    pub fn status_code(&self) -> u16 {
        match self {
            UpstreamError::Status(code) => *code,
            _ => 0,
        }
    }
}

/// Configuration problems, either local settings or a remote override
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("remote site config rejected: {0}")]
    InvalidRemote(String),
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttled_message_carries_retry_hint() {
        let err = Throttled { retry_after_secs: 42 };
        assert_eq!(err.to_string(), "too many requests, retry in 42s");
    }

    #[test]
    fn only_status_errors_have_a_code() {
        assert_eq!(UpstreamError::Status(503).status_code(), 503);
        assert_eq!(UpstreamError::Timeout(10).status_code(), 0);
        assert_eq!(UpstreamError::Decode("eof".into()).status_code(), 0);
    }
}
