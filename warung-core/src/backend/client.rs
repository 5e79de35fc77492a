//! Typed client for the media backend
//!
//! Every operation answers with an [`ApiResponse`]. Successful bodies are
//! cached per (api key, url) for the configured TTL; failures are never
//! cached and come back as an `error` envelope so pages can render an empty
//! state.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::signing;
use super::types::ApiResponse;
use super::upstream::{Upstream, UpstreamRequest};
use crate::cache::{FetchCache, SwrCache, SwrStatus};
use crate::clock::SharedClock;
use crate::config::{BackendConfig, CachesConfig};
use crate::error::UpstreamError;
use crate::hash::hex_hash;
use crate::logging::{ErrorLog, RequestTag};
use crate::site::{EffectiveConfig, RemoteSiteConfig, SiteConfig};
use crate::tasks::BackgroundTasks;

/// Query parameters forwarded to the backend, in the order they are sent
pub const ALLOWED_PARAMS: &[&str] =
    &["page", "limit", "type", "q", "search_in", "sort", "order", "per_page"];

/// Longest value forwarded for any parameter, in characters
pub const MAX_PARAM_CHARS: usize = 200;

/// Backend query parameters. Unknown names are dropped when the url is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(BTreeMap<String, String>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl ToString) -> Self {
        self.0.insert(name.to_string(), value.to_string());
        self
    }

    pub fn page(page: u32) -> Self {
        Self::new().with("page", page)
    }

    /// `self` on top of `base`; names set in `self` win
    fn over(self, mut base: Query) -> Query {
        base.0.extend(self.0);
        base
    }

    /// Filtered, truncated and encoded query string, `?` included when not empty
    pub fn to_query_string(&self) -> String {
        let pairs: Vec<String> = ALLOWED_PARAMS
            .iter()
            .filter_map(|name| {
                self.0.get(*name).map(|value| {
                    let value: String = value.chars().take(MAX_PARAM_CHARS).collect();
                    format!("{}={}", name, urlencoding::encode(&value))
                })
            })
            .collect();
        if pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", pairs.join("&"))
        }
    }
}

/// Instance-wide backend state shared by every [`MediaClient`]
#[derive(Debug)]
pub struct BackendContext {
    upstream: Arc<dyn Upstream>,
    responses: FetchCache,
    overrides: SwrCache<String, RemoteSiteConfig>,
    tasks: BackgroundTasks,
    clock: SharedClock,
    config: BackendConfig,
    response_ttl: Duration,
    error_log: Arc<ErrorLog>,
}

impl BackendContext {
    pub fn new(
        backend: &BackendConfig,
        caches: &CachesConfig,
        upstream: Arc<dyn Upstream>,
        tasks: BackgroundTasks,
        clock: SharedClock,
        error_log: Arc<ErrorLog>,
    ) -> Self {
        let response_ttl = Duration::from_secs(caches.api_ttl_secs);
        Self {
            responses: FetchCache::new(caches.api_capacity, response_ttl, clock.clone()),
            overrides: SwrCache::new(
                caches.overrides_capacity,
                backend.overrides_fresh_for(),
                clock.clone(),
            ),
            upstream,
            tasks,
            clock,
            config: backend.clone(),
            response_ttl,
            error_log,
        }
    }

    pub fn upstream(&self) -> &Arc<dyn Upstream> {
        &self.upstream
    }

    /// Response cache; also backs generic cached fetches
    pub fn responses(&self) -> &FetchCache {
        &self.responses
    }

    pub fn overrides(&self) -> &SwrCache<String, RemoteSiteConfig> {
        &self.overrides
    }
}

/// Backend client bound to one resolved site
#[derive(Debug, Clone)]
pub struct MediaClient {
    ctx: Arc<BackendContext>,
    site: Arc<SiteConfig>,
    tag: Option<RequestTag>,
}

impl MediaClient {
    pub fn new(ctx: Arc<BackendContext>, site: Arc<SiteConfig>) -> Self {
        Self { ctx, site, tag: None }
    }

    /// Attach the request to error reports
    pub fn with_tag(mut self, tag: RequestTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    fn api_base(&self) -> String {
        format!("{}/api/v1", self.site.backend_url)
    }

    /// `apicache:<hex_hash(api_key, 8)>:<hex_hash(url, 16)>`
    pub fn cache_key(&self, url: &str) -> String {
        format!("apicache:{}:{}", hex_hash(&self.site.api_key, 8), hex_hash(url, 16))
    }

    fn upstream_request(&self, url: String) -> UpstreamRequest {
        UpstreamRequest {
            url,
            api_key: self.site.api_key.clone(),
            user_agent: format!("{} ({})", self.ctx.config.user_agent, self.site.domain),
        }
    }

    async fn request(&self, url: String) -> Result<ApiResponse, UpstreamError> {
        let value = self.ctx.upstream.get_json(&self.upstream_request(url)).await?;
        ApiResponse::from_value(value)
            .ok_or_else(|| UpstreamError::InvalidPayload("expected a JSON object".to_string()))
    }

    fn degrade(&self, err: &UpstreamError) -> ApiResponse {
        self.ctx.error_log.report("backend.fetch", err, self.tag.as_ref());
        ApiResponse::unavailable(err.status_code())
    }

    async fn fetch(&self, path: &str, query: Query, use_cache: bool) -> ApiResponse {
        let url = format!("{}{}{}", self.api_base(), path, query.to_query_string());
        if !use_cache {
            return match self.request(url).await {
                Ok(resp) => resp,
                Err(err) => self.degrade(&err),
            };
        }

        let key = self.cache_key(&url);
        let outcome = self
            .ctx
            .responses
            .get_or_fetch(&key, self.ctx.response_ttl, || async {
                self.request(url).await.map_err(anyhow::Error::from)
            })
            .await;
        match outcome {
            Ok(resp) => resp,
            Err(err) => match err.downcast_ref::<UpstreamError>() {
                Some(upstream) => self.degrade(upstream),
                None => {
                    self.ctx.error_log.report("backend.fetch", &err, self.tag.as_ref());
                    ApiResponse::unavailable(0)
                }
            },
        }
    }

    pub async fn media_list(&self, query: Query) -> ApiResponse {
        self.fetch("/media", query, true).await
    }

    pub async fn media_detail(&self, id: i64) -> ApiResponse {
        if id < 1 {
            return ApiResponse::empty();
        }
        self.fetch(&format!("/media/{}", id), Query::new(), true).await
    }

    pub async fn trending(&self, limit: u32, kind: Option<&str>) -> ApiResponse {
        let mut query = Query::new().with("limit", limit);
        if let Some(kind) = kind.filter(|k| !k.is_empty()) {
            query = query.with("type", kind);
        }
        self.fetch("/trending", query, true).await
    }

    /// Queries shorter than two characters never reach the backend
    pub async fn search(&self, q: &str, query: Query) -> ApiResponse {
        if q.trim().chars().count() < 2 {
            return ApiResponse::empty();
        }
        self.fetch("/search", query.over(Query::new().with("q", q)), true).await
    }

    /// Media carrying `tag`. When the tag endpoint answers with an error the
    /// lookup is retried as a tag-scoped search. Neither call is cached.
    pub async fn by_tag(&self, tag: &str, query: Query) -> ApiResponse {
        let tag = tag.trim();
        if tag.is_empty() {
            return ApiResponse::empty();
        }
        let path = format!("/tags-media/{}", urlencoding::encode(tag));
        let result = self.fetch(&path, query.clone(), false).await;
        if !result.is_error() {
            return result;
        }
        log::debug!("tag endpoint failed for '{}', falling back to search", tag);
        let fallback = query.over(Query::new().with("q", tag).with("search_in", "tags"));
        self.fetch("/search", fallback, false).await
    }

    pub async fn tags(&self, limit: u32) -> ApiResponse {
        self.fetch("/tags", Query::new().with("limit", limit), true).await
    }

    pub async fn categories(&self) -> ApiResponse {
        self.fetch("/categories", Query::new(), true).await
    }

    pub async fn album(&self, id: i64) -> ApiResponse {
        if id < 1 {
            return ApiResponse::empty();
        }
        self.fetch(&format!("/album/{}", id), Query::new(), true).await
    }

    pub async fn related(&self, id: i64, limit: u32) -> ApiResponse {
        if id < 1 {
            return ApiResponse::empty();
        }
        self.fetch(&format!("/related/{}", id), Query::new().with("limit", limit), true).await
    }

    /// Remote site override, served stale-while-revalidate per domain.
    /// An invalid or unreachable `/config` leaves the previous value in place.
    pub async fn site_overrides(&self) -> (Option<RemoteSiteConfig>, SwrStatus) {
        let request = self.upstream_request(format!("{}/config", self.api_base()));
        let upstream = self.ctx.upstream.clone();
        let error_log = self.ctx.error_log.clone();
        let tag = self.tag.clone();

        self.ctx
            .overrides
            .get_or_refresh(self.site.domain.clone(), &self.ctx.tasks, move || async move {
                let payload = match upstream.get_json(&request).await {
                    Ok(payload) => payload,
                    Err(err) => {
                        error_log.report("backend.config", &err, tag.as_ref());
                        return Ok(None);
                    }
                };
                match RemoteSiteConfig::from_envelope(&payload) {
                    Ok(remote) => Ok(Some(remote)),
                    Err(err) => {
                        log::warn!("ignoring remote site config: {}", err);
                        Ok(None)
                    }
                }
            })
            .await
    }

    /// The resolved site with any remote override applied
    pub async fn effective_config(&self) -> EffectiveConfig {
        let (remote, _) = self.site_overrides().await;
        EffectiveConfig::new(self.site.clone(), remote)
    }

    /// Signed player link, timestamped now
    pub fn player_url(&self, id: u64) -> String {
        signing::player_url(&self.site, id, self.ctx.clock.now_secs())
    }

    /// Signed download link, timestamped now
    pub fn download_url(&self, id: u64) -> String {
        signing::download_url(&self.site, id, self.ctx.clock.now_secs())
    }
}
