//! Request view used by the shield and the page handlers

use http::header::{HeaderMap, HeaderName, HeaderValue, HOST, USER_AGENT};
use http::Method;
use std::net::SocketAddr;

use crate::logging::RequestTag;

/// Address used when neither the proxy header nor the socket gives one
pub const UNKNOWN_CLIENT_IP: &str = "0.0.0.0";

/// Everything the edge reads from an incoming request
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    /// Host header without scheme; may carry a port
    pub host: Option<String>,
    pub headers: HeaderMap,
    pub client_ip: String,
    /// First 8 chars of a v4 uuid
    pub request_id: String,
    pub started_at_ms: u64,
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

impl RequestInfo {
    /// Build from hyper request parts. The client address comes from
    /// `client_ip_header` when the fronting proxy sets it, else the socket.
    pub fn from_parts(
        parts: &http::request::Parts,
        client_ip_header: &str,
        remote: Option<SocketAddr>,
        now_ms: u64,
    ) -> Self {
        let header_ip = parts
            .headers
            .get(client_ip_header)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty());
        let client_ip = header_ip
            .or_else(|| remote.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN_CLIENT_IP.to_string());
        let host = parts
            .headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()));

        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            host,
            headers: parts.headers.clone(),
            client_ip,
            request_id: new_request_id(),
            started_at_ms: now_ms,
        }
    }

    /// Header value as text; empty when missing or not visible ASCII
    pub fn header(&self, name: &str) -> &str {
        self.headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
    }

    pub fn user_agent(&self) -> &str {
        self.headers.get(USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or("")
    }

    /// Decoded query parameter
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key != name {
                return None;
            }
            urlencoding::decode(&value.replace('+', " ")).ok().map(|v| v.into_owned())
        })
    }

    pub fn tag(&self) -> RequestTag {
        RequestTag::new(&self.client_ip, self.user_agent(), &self.request_id, self.started_at_ms)
    }

    /// Bare GET request, for tests and tools
    pub fn get(path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (path_and_query.to_string(), None),
        };
        Self {
            method: Method::GET,
            path,
            query,
            host: None,
            headers: HeaderMap::new(),
            client_ip: UNKNOWN_CLIENT_IP.to_string(),
            request_id: new_request_id(),
            started_at_ms: 0,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_ip(mut self, ip: &str) -> Self {
        self.client_ip = ip.to_string();
        self
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// Set a header; invalid names or values are ignored
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) =
            (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value))
        {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_user_agent(self, ua: &str) -> Self {
        self.with_header("user-agent", ua)
    }
}
