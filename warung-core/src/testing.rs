//! Test doubles shared by unit and integration tests

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::backend::{Upstream, UpstreamRequest};
use crate::error::UpstreamError;

#[derive(Debug, Clone)]
enum Scripted {
    Body(Value),
    Status(u16),
}

/// In-memory upstream answering from a script and recording every call.
///
/// A route matches when the request path (query string excluded) ends with
/// its pattern; the most recently scripted match wins. Unscripted GETs answer
/// 404, POSTs answer 200.
#[derive(Debug, Default)]
pub struct ScriptedUpstream {
    routes: Mutex<Vec<(String, Scripted)>>,
    gets: Mutex<Vec<String>>,
    posts: Mutex<Vec<(String, Value)>>,
    post_status: Mutex<Option<u16>>,
}

impl ScriptedUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, pattern: &str, body: Value) {
        self.script(pattern, Scripted::Body(body));
    }

    pub fn fail(&self, pattern: &str, status: u16) {
        self.script(pattern, Scripted::Status(status));
    }

    /// Status returned by every POST
    pub fn post_status(&self, status: u16) {
        *self.post_status.lock().unwrap_or_else(|e| e.into_inner()) = Some(status);
    }

    fn script(&self, pattern: &str, answer: Scripted) {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        routes.retain(|(p, _)| p != pattern);
        routes.push((pattern.to_string(), answer));
    }

    /// Every GET url, oldest first
    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// GETs whose path ends with `pattern`
    pub fn get_count(&self, pattern: &str) -> usize {
        self.gets().iter().filter(|url| path_of(url).ends_with(pattern)).count()
    }

    /// Every POST as (url, body), oldest first
    pub fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

fn path_of(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn get_json(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        self.gets.lock().unwrap_or_else(|e| e.into_inner()).push(request.url.clone());
        let path = path_of(&request.url);
        let routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        match routes.iter().rev().find(|(pattern, _)| path.ends_with(pattern.as_str())) {
            Some((_, Scripted::Body(body))) => Ok(body.clone()),
            Some((_, Scripted::Status(code))) => Err(UpstreamError::Status(*code)),
            None => Err(UpstreamError::Status(404)),
        }
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<u16, UpstreamError> {
        self.posts.lock().unwrap_or_else(|e| e.into_inner()).push((url.to_string(), body.clone()));
        Ok(self.post_status.lock().unwrap_or_else(|e| e.into_inner()).unwrap_or(200))
    }
}
