//! Transport seam for the media backend and the indexing endpoints

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;

use crate::error::UpstreamError;

/// One authenticated GET against the media backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub url: String,
    pub api_key: String,
    pub user_agent: String,
}

/// Outbound HTTP used by the backend client and the IndexNow pinger
#[async_trait]
pub trait Upstream: Send + Sync + Debug {
    /// GET `request.url` and decode the body as JSON. Non-2xx answers are
    /// [`UpstreamError::Status`].
    async fn get_json(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError>;

    /// POST `body` as JSON; returns the response status
    async fn post_json(&self, url: &str, body: &Value) -> Result<u16, UpstreamError>;
}

/// reqwest-backed upstream. Every call is bounded by the client timeout.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpUpstream {
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    fn map_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout.as_secs())
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            UpstreamError::Status(status.as_u16())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get_json(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .get(&request.url)
            .header("X-API-Key", &request.api_key)
            .header("Accept", "application/json")
            .header("User-Agent", &request.user_agent)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        response.json::<Value>().await.map_err(|e| self.map_error(e))
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<u16, UpstreamError> {
        let response =
            self.client.post(url).json(body).send().await.map_err(|e| self.map_error(e))?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_timeout() {
        let upstream = HttpUpstream::new(Duration::from_secs(10)).unwrap();
        assert_eq!(upstream.timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let upstream = HttpUpstream::new(Duration::from_secs(2)).unwrap();
        let request = UpstreamRequest {
            url: "http://127.0.0.1:9/api/v1/media".to_string(),
            api_key: "k".to_string(),
            user_agent: "test".to_string(),
        };
        let err = upstream.get_json(&request).await.unwrap_err();
        assert_eq!(err.status_code(), 0);
    }
}
