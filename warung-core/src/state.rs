//! The long-lived service object
//!
//! One [`WarungState`] per runtime instance owns every piece of shared
//! state: caches, counters, the background task set. Request handlers borrow
//! it; nothing lives in globals.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{BackendContext, HttpUpstream, MediaClient, Upstream};
use crate::clock::{system_clock, SharedClock};
use crate::config::WarungConfig;
use crate::error::UpstreamError;
use crate::http::render::{BasicRenderer, PageRenderer};
use crate::indexing::{IndexNowPinger, KeywordCatalog};
use crate::logging::ErrorLog;
use crate::security::Gate;
use crate::site::{ConfigResolver, SiteConfig};
use crate::tasks::BackgroundTasks;

#[derive(Debug)]
pub struct WarungState {
    config: WarungConfig,
    clock: SharedClock,
    resolver: ConfigResolver,
    gate: Gate,
    backend: Arc<BackendContext>,
    pinger: IndexNowPinger,
    catalog: KeywordCatalog,
    tasks: BackgroundTasks,
    error_log: Arc<ErrorLog>,
    renderer: Arc<dyn PageRenderer>,
}

impl WarungState {
    /// Build the service around an upstream and a clock
    pub fn new(config: WarungConfig, clock: SharedClock, upstream: Arc<dyn Upstream>) -> Self {
        let caches = &config.caches;
        let tasks = BackgroundTasks::new();
        let error_log = Arc::new(ErrorLog::new(
            caches.error_log_capacity,
            Duration::from_secs(caches.error_log_ttl_secs),
            clock.clone(),
        ));
        let backend = Arc::new(BackendContext::new(
            &config.backend,
            caches,
            upstream.clone(),
            tasks.clone(),
            clock.clone(),
            error_log.clone(),
        ));
        let pinger =
            IndexNowPinger::new(&config.indexing, caches, upstream, tasks.clone(), clock.clone());

        Self {
            resolver: ConfigResolver::new(caches.config_capacity, caches.preview_host_suffixes.clone()),
            gate: Gate::new(&config.shield, caches, clock.clone()),
            catalog: KeywordCatalog::from_config(&config.indexing),
            renderer: Arc::new(BasicRenderer),
            backend,
            pinger,
            tasks,
            error_log,
            clock,
            config,
        }
    }

    /// Production wiring: wall clock and the reqwest upstream
    pub fn from_config(config: WarungConfig) -> Result<Self, UpstreamError> {
        let upstream = HttpUpstream::new(config.backend.timeout())?;
        Ok(Self::new(config, system_clock(), Arc::new(upstream)))
    }

    /// Replace the bundled page renderer
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &WarungConfig {
        &self.config
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn backend(&self) -> &Arc<BackendContext> {
        &self.backend
    }

    pub fn pinger(&self) -> &IndexNowPinger {
        &self.pinger
    }

    pub fn catalog(&self) -> &KeywordCatalog {
        &self.catalog
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    pub fn renderer(&self) -> &Arc<dyn PageRenderer> {
        &self.renderer
    }

    /// Resolved site for a request host
    pub fn resolve_site(&self, host: Option<&str>) -> Arc<SiteConfig> {
        self.resolver.resolve(&self.config.site, host)
    }

    /// Backend client bound to `site`
    pub fn client(&self, site: Arc<SiteConfig>) -> MediaClient {
        MediaClient::new(self.backend.clone(), site)
    }

    /// Cached value for `key`, produced on a miss and kept for `ttl`.
    /// Producer errors are returned and not cached.
    pub async fn cached_fetch<V, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> anyhow::Result<V>
    where
        V: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        self.backend.responses().get_or_fetch(key, ttl, producer).await
    }

    /// Wait for background work, bounded by the configured grace period
    pub async fn shutdown(&self) {
        let grace = Duration::from_secs(self.config.server.shutdown_grace_secs);
        if tokio::time::timeout(grace, self.tasks.drain()).await.is_err() {
            log::warn!("{} background tasks still running after {:?}", self.tasks.pending(), grace);
        }
    }
}
