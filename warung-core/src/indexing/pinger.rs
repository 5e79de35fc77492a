//! IndexNow submissions
//!
//! Pings are background work: callers get a yes/no for "scheduled" and the
//! submissions run on [`BackgroundTasks`]. Endpoint failures are logged and
//! dropped.

use futures::future::join_all;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::keywords::{slugify, KeywordCatalog};
use crate::backend::{item_path, MediaClient, Upstream};
use crate::cache::{Cache, TtlCache};
use crate::clock::SharedClock;
use crate::config::{CachesConfig, IndexingConfig};
use crate::hash::hex_hash;
use crate::tasks::BackgroundTasks;

/// Most URLs accepted in one submission
pub const MAX_URLS_PER_PING: usize = 50;

/// Trending items submitted when a crawler reads the sitemap
const SITEMAP_TRENDING_ITEMS: u32 = 20;
/// Keyword landing urls submitted alongside them
const SITEMAP_KEYWORD_URLS: usize = 30;

/// IndexNow key of a host
pub fn key_for(host: &str) -> String {
    hex_hash(host, 16)
}

/// Submission body for `urls` (truncated to [`MAX_URLS_PER_PING`])
pub fn payload(host: &str, urls: &[String]) -> Value {
    let key = key_for(host);
    let urls: Vec<&String> = urls.iter().take(MAX_URLS_PER_PING).collect();
    json!({
        "host": host,
        "key": key,
        "keyLocation": format!("https://{}/{}.txt", host, key),
        "urlList": urls,
    })
}

#[derive(Debug)]
struct PingerInner {
    upstream: Arc<dyn Upstream>,
    config: IndexingConfig,
    /// Epoch seconds of the last scheduled run, 0 when it never ran
    last_run: AtomicU64,
    recent_hits: Mutex<TtlCache<String, ()>>,
    clock: SharedClock,
}

/// Long-lived IndexNow pinger for one instance
#[derive(Debug, Clone)]
pub struct IndexNowPinger {
    inner: Arc<PingerInner>,
    tasks: BackgroundTasks,
}

impl IndexNowPinger {
    pub fn new(
        config: &IndexingConfig,
        caches: &CachesConfig,
        upstream: Arc<dyn Upstream>,
        tasks: BackgroundTasks,
        clock: SharedClock,
    ) -> Self {
        let window = Duration::from_secs(config.keyword_ping_dedupe_secs);
        Self {
            inner: Arc::new(PingerInner {
                upstream,
                config: config.clone(),
                last_run: AtomicU64::new(0),
                recent_hits: Mutex::new(TtlCache::with_clock(
                    caches.error_log_capacity,
                    window,
                    clock.clone(),
                )),
                clock,
            }),
            tasks,
        }
    }

    pub fn enabled(&self) -> bool {
        self.inner.config.enabled
    }

    /// Whether `path` is the key file of `host`
    pub fn is_key_file(&self, path: &str, host: &str) -> bool {
        path.strip_prefix('/')
            .and_then(|p| p.strip_suffix(".txt"))
            .is_some_and(|name| name == key_for(host))
    }

    /// Submit `urls` to every endpoint concurrently. Returns how many
    /// endpoints accepted the submission.
    pub async fn ping(&self, host: &str, urls: &[String]) -> usize {
        self.inner.ping(host, urls).await
    }

    /// Start the periodic submission of every keyword landing url unless it
    /// already ran within the interval. Returns whether a run was started.
    pub fn maybe_schedule(&self, host: &str, catalog: &KeywordCatalog) -> bool {
        if !self.enabled() || catalog.is_empty() {
            return false;
        }
        let now = self.inner.clock.now_secs();
        let last = self.inner.last_run.load(Ordering::SeqCst);
        if last != 0 && now.saturating_sub(last) < self.inner.config.interval_secs {
            return false;
        }
        if self
            .inner
            .last_run
            .compare_exchange(last, now.max(1), Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let inner = self.inner.clone();
        let host = host.to_string();
        let urls = catalog.urls(&host);
        log::info!("scheduled IndexNow run for {} ({} urls)", host, urls.len());
        self.tasks.spawn("indexnow-scheduled", async move {
            let batch_size = inner.config.batch_size.clamp(1, MAX_URLS_PER_PING);
            let pause = Duration::from_millis(inner.config.batch_pause_ms);
            let batches: Vec<&[String]> = urls.chunks(batch_size).collect();
            for (i, batch) in batches.iter().enumerate() {
                inner.ping(&host, batch).await;
                if i + 1 < batches.len() {
                    tokio::time::sleep(pause).await;
                }
            }
            Ok(())
        });
        true
    }

    /// Submit one landing url after a visit, at most once per dedupe window
    /// per keyword. Returns whether a submission was started.
    pub fn ping_on_keyword_hit(&self, host: &str, catalog: &KeywordCatalog, keyword: &str) -> bool {
        if !self.enabled() {
            return false;
        }
        let marker = format!("pingkw:{}", slugify(keyword));
        {
            let mut recent = self.inner.recent_hits.lock().unwrap_or_else(|e| e.into_inner());
            if recent.contains_key(&marker) {
                return false;
            }
            recent.insert(marker, ());
        }

        let inner = self.inner.clone();
        let host = host.to_string();
        let url = catalog.url_for(&host, keyword);
        self.tasks.spawn("indexnow-keyword", async move {
            inner.ping(&host, &[url]).await;
            Ok(())
        });
        true
    }

    /// Submit trending content and keyword landing urls after a search
    /// crawler fetched the sitemap, at most once per dedupe window per host.
    /// The trending lookup runs in the background. Returns whether a
    /// submission was started.
    pub fn ping_on_sitemap(&self, client: MediaClient, catalog: &KeywordCatalog) -> bool {
        if !self.enabled() {
            return false;
        }
        let host = client.site().domain.clone();
        {
            let window = Duration::from_secs(self.inner.config.sitemap_ping_dedupe_secs);
            let mut recent = self.inner.recent_hits.lock().unwrap_or_else(|e| e.into_inner());
            let marker = format!("pingsitemap:{}", host);
            if recent.contains_key(&marker) {
                return false;
            }
            recent.insert_with_ttl(marker, (), window);
        }

        let inner = self.inner.clone();
        let keyword_urls: Vec<String> = catalog.urls(&host).into_iter().take(SITEMAP_KEYWORD_URLS).collect();
        self.tasks.spawn("indexnow-sitemap", async move {
            let trending = client.trending(SITEMAP_TRENDING_ITEMS, None).await;
            let site = client.site();
            let mut seen = HashSet::new();
            let urls: Vec<String> = trending
                .items()
                .iter()
                .map(|item| site.absolute_url(site.strip_base_path(&item_path(item, site))))
                .chain(keyword_urls)
                .filter(|url| seen.insert(url.clone()))
                .collect();
            log::debug!("sitemap fetch on {} submits {} urls", host, urls.len());
            inner.ping(&host, &urls).await;
            Ok(())
        });
        true
    }
}

impl PingerInner {
    async fn ping(&self, host: &str, urls: &[String]) -> usize {
        if urls.is_empty() {
            return 0;
        }
        let body = payload(host, urls);
        let submissions = self.config.endpoints.iter().map(|endpoint| {
            let body = &body;
            async move {
                match self.upstream.post_json(endpoint, body).await {
                    Ok(status) if (200..300).contains(&status) => {
                        log::debug!("IndexNow {} accepted {} urls ({})", endpoint, urls.len(), status);
                        true
                    }
                    Ok(status) => {
                        log::warn!("IndexNow {} answered HTTP {}", endpoint, status);
                        false
                    }
                    Err(err) => {
                        log::warn!("IndexNow {} failed: {}", endpoint, err);
                        false
                    }
                }
            }
        });
        join_all(submissions).await.into_iter().filter(|accepted| *accepted).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::ScriptedUpstream;

    const START_MS: u64 = 1_700_000_000_000;

    fn pinger(upstream: Arc<ScriptedUpstream>, clock: SharedClock) -> IndexNowPinger {
        let config = IndexingConfig { batch_pause_ms: 0, ..Default::default() };
        IndexNowPinger::new(&config, &CachesConfig::default(), upstream, BackgroundTasks::new(), clock)
    }

    fn catalog(n: usize) -> KeywordCatalog {
        KeywordCatalog::new((0..n).map(|i| format!("keyword {}", i)).collect(), "k")
    }

    #[test]
    fn payload_is_bounded_and_points_at_the_key_file() {
        let urls: Vec<String> = (0..60).map(|i| format!("https://example.com/{}", i)).collect();
        let body = payload("example.com", &urls);
        let key = key_for("example.com");
        assert_eq!(key.len(), 16);
        assert_eq!(body["key"], key);
        assert_eq!(body["keyLocation"], format!("https://example.com/{}.txt", key));
        assert_eq!(body["urlList"].as_array().unwrap().len(), MAX_URLS_PER_PING);
    }

    #[test]
    fn key_file_path_matches_host_key() {
        let p = pinger(ScriptedUpstream::new(), ManualClock::starting_at(START_MS));
        let key = key_for("example.com");
        assert!(p.is_key_file(&format!("/{}.txt", key), "example.com"));
        assert!(!p.is_key_file("/robots.txt", "example.com"));
    }

    #[tokio::test]
    async fn ping_posts_to_every_endpoint() {
        let upstream = ScriptedUpstream::new();
        let p = pinger(upstream.clone(), ManualClock::starting_at(START_MS));
        let accepted = p.ping("example.com", &["https://example.com/k/a".to_string()]).await;
        assert_eq!(accepted, 3);
        let posts = upstream.posts();
        assert_eq!(posts.len(), 3);
        assert!(posts.iter().any(|(url, _)| url.contains("bing.com")));

        upstream.post_status(500);
        assert_eq!(p.ping("example.com", &["https://example.com/".to_string()]).await, 0);
    }

    #[tokio::test]
    async fn scheduled_run_is_gated_by_interval() {
        let upstream = ScriptedUpstream::new();
        let clock = ManualClock::starting_at(START_MS);
        let p = pinger(upstream.clone(), clock.clone());
        let catalog = catalog(120);

        assert!(p.maybe_schedule("example.com", &catalog));
        assert!(!p.maybe_schedule("example.com", &catalog));
        p.tasks.drain().await;
        // 120 urls -> 3 batches, each to 3 endpoints
        assert_eq!(upstream.posts().len(), 9);

        clock.advance(Duration::from_secs(6 * 3600 - 1));
        assert!(!p.maybe_schedule("example.com", &catalog));
        clock.advance(Duration::from_secs(1));
        assert!(p.maybe_schedule("example.com", &catalog));
        p.tasks.drain().await;
    }

    #[tokio::test]
    async fn keyword_hits_are_deduplicated() {
        let upstream = ScriptedUpstream::new();
        let clock = ManualClock::starting_at(START_MS);
        let p = pinger(upstream.clone(), clock.clone());
        let catalog = catalog(2);

        assert!(p.ping_on_keyword_hit("example.com", &catalog, "keyword 1"));
        assert!(!p.ping_on_keyword_hit("example.com", &catalog, "keyword 1"));
        assert!(p.ping_on_keyword_hit("example.com", &catalog, "keyword 0"));
        clock.advance(Duration::from_secs(61));
        assert!(p.ping_on_keyword_hit("example.com", &catalog, "keyword 1"));
        p.tasks.drain().await;

        let posts = upstream.posts();
        assert_eq!(posts.len(), 9);
        assert!(posts.iter().all(|(_, body)| body["urlList"].as_array().unwrap().len() == 1));
        assert!(posts.iter().any(|(_, body)| body["urlList"][0] == "https://example.com/k/keyword-1"));
    }
}
