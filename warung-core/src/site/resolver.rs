//! Per-domain configuration resolution with a signature-keyed snapshot cache

use lazy_static::lazy_static;
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::config::SiteConfig;
use super::env::{non_empty, SiteEnv};
use crate::cache::{Cache, LruCache};

const FALLBACK_DOMAIN: &str = "localhost";
const FALLBACK_NAME: &str = "Warung";

lazy_static! {
    static ref SEPARATORS: Regex = Regex::new(r"[_-]+").expect("valid regex literal");
    static ref CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z])([A-Z])").expect("valid regex literal");
}

/// Display name derived from a hostname label: `my-warung` -> `My Warung`,
/// `cinemaKita` -> `Cinema Kita`
pub fn subdomain_to_name(label: &str) -> String {
    let spaced = SEPARATORS.replace_all(label, " ");
    let spaced = CAMEL_BOUNDARY.replace_all(&spaced, "$1 $2");

    let mut out = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for c in spaced.chars() {
        let word_char = c.is_alphanumeric() || c == '_';
        if word_char && at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !word_char;
    }
    out.trim().to_string()
}

/// Hostname without port
fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Resolves the site configuration for a request and caches the result.
///
/// Snapshots are keyed by `domain:signature`, where the signature covers
/// every input variable, so changing any input yields a fresh snapshot.
/// Nothing is cached while the domain is unpinned (`WARUNG_DOMAIN` unset)
/// or served from a preview hostname.
#[derive(Debug)]
pub struct ConfigResolver {
    cache: Mutex<LruCache<String, Arc<SiteConfig>>>,
    preview_suffixes: Vec<String>,
    computations: AtomicU64,
}

impl ConfigResolver {
    pub fn new(capacity: usize, preview_suffixes: Vec<String>) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            preview_suffixes,
            computations: AtomicU64::new(0),
        }
    }

    /// Domain and display name for this request
    pub fn detect(env: &SiteEnv, host: Option<&str>) -> (String, String) {
        if let (Some(domain), Some(name)) = (non_empty(&env.warung_domain), non_empty(&env.warung_name)) {
            return (domain.to_string(), name.to_string());
        }
        let hostname = host.map(strip_port).filter(|h| !h.is_empty());
        let domain = non_empty(&env.warung_domain)
            .or(hostname)
            .unwrap_or(FALLBACK_DOMAIN)
            .to_string();
        let name = match (non_empty(&env.warung_name), hostname) {
            (Some(name), _) => name.to_string(),
            (None, Some(host)) => subdomain_to_name(host.split('.').next().unwrap_or(host)),
            (None, None) => FALLBACK_NAME.to_string(),
        };
        (domain, name)
    }

    fn is_preview(&self, domain: &str) -> bool {
        self.preview_suffixes.iter().any(|suffix| domain.ends_with(suffix.as_str()))
    }

    /// Resolve the configuration for `host` under `env`
    pub fn resolve(&self, env: &SiteEnv, host: Option<&str>) -> Arc<SiteConfig> {
        let (domain, name) = Self::detect(env, host);
        let cacheable = non_empty(&env.warung_domain).is_some() && !self.is_preview(&domain);
        let key = format!("{}:{}", domain, env.signature());

        if cacheable {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(hit) = cache.get(&key) {
                return hit.clone();
            }
        }

        self.computations.fetch_add(1, Ordering::Relaxed);
        let snapshot = Arc::new(SiteConfig::assemble(env, &domain, &name));
        log::debug!("resolved site config for {} (cacheable: {})", domain, cacheable);

        if cacheable {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.insert(key, snapshot.clone());
        }
        snapshot
    }

    /// How many snapshots have been assembled so far
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ConfigResolver {
        ConfigResolver::new(10, vec![".pages.dev".into(), ".workers.dev".into()])
    }

    fn pinned(domain: &str) -> SiteEnv {
        SiteEnv { warung_domain: Some(domain.into()), ..Default::default() }
    }

    #[test]
    fn names_from_labels() {
        assert_eq!(subdomain_to_name("my-warung"), "My Warung");
        assert_eq!(subdomain_to_name("cinemaKita"), "Cinema Kita");
        assert_eq!(subdomain_to_name("nonton__film"), "Nonton Film");
        assert_eq!(subdomain_to_name("abc"), "Abc");
    }

    #[test]
    fn detect_prefers_env_then_host() {
        let env = SiteEnv {
            warung_domain: Some("a.com".into()),
            warung_name: Some("Alpha".into()),
            ..Default::default()
        };
        assert_eq!(ConfigResolver::detect(&env, Some("b.com")), ("a.com".into(), "Alpha".into()));

        let env = SiteEnv::default();
        assert_eq!(
            ConfigResolver::detect(&env, Some("film-seru.example.com:8443")),
            ("film-seru.example.com".into(), "Film Seru".into())
        );
        assert_eq!(ConfigResolver::detect(&env, None), ("localhost".into(), "Warung".into()));
    }

    #[test]
    fn identical_inputs_share_one_snapshot() {
        let resolver = resolver();
        let env = pinned("example.com");
        let a = resolver.resolve(&env, Some("example.com"));
        let b = resolver.resolve(&env, Some("example.com"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(resolver.computations(), 1);
    }

    #[test]
    fn any_input_change_misses() {
        let resolver = resolver();
        let env = pinned("example.com");
        resolver.resolve(&env, None);

        let mut changed = env.clone();
        changed.path_content = Some("watch".into());
        let cfg = resolver.resolve(&changed, None);
        assert_eq!(cfg.paths.content, "watch");
        assert_eq!(resolver.computations(), 2);
    }

    #[test]
    fn preview_and_unpinned_hosts_are_never_cached() {
        let resolver = resolver();
        let env = pinned("site.pages.dev");
        resolver.resolve(&env, None);
        resolver.resolve(&env, None);
        assert_eq!(resolver.computations(), 2);

        let unpinned = SiteEnv::default();
        resolver.resolve(&unpinned, Some("example.com"));
        resolver.resolve(&unpinned, Some("example.com"));
        assert_eq!(resolver.computations(), 4);
    }
}
