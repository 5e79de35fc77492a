//! The request screening pipeline
//!
//! Order matters and is fixed:
//!
//! 1. static assets pass through untouched
//! 2. the honeypot prefix flags the client and answers empty
//! 3. unless the client is a verified search crawler:
//!    blacklist, then (outside public feeds) blackhole, fake landing and
//!    sacrificial redirect, then the rate limiter
//!
//! After the page is rendered, [`Gate::finish`] applies the cloaking
//! transform that matches the visitor.

use std::time::Duration;

use super::blackhole::Blackhole;
use super::classifier::{classify, VisitorClass};
use super::cloak::Cloak;
use super::decoy::fake_landing_page;
use super::patterns::{is_public_feed, is_scraper_ua, is_search_crawler, is_static_asset};
use super::rate_limit::{RateLimitPolicy, RateLimiter};
use super::reputation::Blacklist;
use super::sacrifice::{EnergyPolicy, SacrificialRedirector};
use crate::clock::SharedClock;
use crate::config::shield::sanitize_prefix;
use crate::config::{CachesConfig, ShieldConfig};
use crate::error::Throttled;
use crate::http::RequestInfo;
use crate::site::SiteConfig;

/// What to do with a request before routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Route normally
    Pass,
    /// Static file; not ours to handle
    Passthrough,
    /// Client hit the honeypot and is now blacklisted; answer 200 empty
    Honeypot,
    /// Client is blacklisted; answer 200 empty
    Silenced,
    /// Serve this decoy html
    Blackhole(String),
    /// Serve this bland html
    FakeLanding(String),
    /// 307 to this location
    Redirect(String),
    Throttled(Throttled),
}

/// Screening result carried to the post-processing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screening {
    pub verdict: Verdict,
    /// Set whenever the classifier ran
    pub visitor: Option<VisitorClass>,
    pub crawler: bool,
    pub public_feed: bool,
    /// Lowercased first path segment below the site base path
    pub first_segment: String,
}

/// Long-lived screening state for one instance
#[derive(Debug)]
pub struct Gate {
    honeypot_prefix: String,
    scraper_agents: Vec<String>,
    fake_landing_enabled: bool,
    blacklist: Blacklist,
    blackhole: Blackhole,
    limiter: RateLimiter,
    sacrifice: SacrificialRedirector,
    cloak: Cloak,
}

impl Gate {
    pub fn new(shield: &ShieldConfig, caches: &CachesConfig, clock: SharedClock) -> Self {
        Self {
            honeypot_prefix: sanitize_prefix(&shield.honeypot_prefix),
            scraper_agents: shield.scraper_agents.clone(),
            fake_landing_enabled: shield.fake_landing_enabled,
            blacklist: Blacklist::new(
                caches.blacklist_capacity,
                Duration::from_secs(shield.blacklist_retention_secs),
                clock.clone(),
            ),
            blackhole: Blackhole::new(
                shield.blackhole_enabled,
                shield.blackhole_max_requests,
                caches.blackhole_capacity,
            ),
            limiter: RateLimiter::new(
                RateLimitPolicy::from(shield),
                caches.rate_limit_capacity,
                clock.clone(),
            ),
            sacrifice: SacrificialRedirector::new(
                shield.sacrifice_enabled,
                EnergyPolicy { max: shield.sacrifice_energy_max, step: shield.sacrifice_energy_step },
                caches.sacrifice_capacity,
                clock.clone(),
            ),
            cloak: Cloak::new(
                shield.dna_enabled,
                shield.css_stego_enabled,
                caches.cloak_capacity,
                Duration::from_secs(caches.cloak_ttl_secs),
                clock,
            ),
        }
    }

    pub fn honeypot_prefix(&self) -> &str {
        &self.honeypot_prefix
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn blackhole(&self) -> &Blackhole {
        &self.blackhole
    }

    pub fn sacrifice(&self) -> &SacrificialRedirector {
        &self.sacrifice
    }

    pub fn cloak(&self) -> &Cloak {
        &self.cloak
    }

    /// Run the pre-routing pipeline
    pub fn screen(&self, req: &RequestInfo, site: &SiteConfig) -> Screening {
        let first_segment = site
            .strip_base_path(&req.path)
            .split('/')
            .next()
            .unwrap_or("")
            .to_lowercase();
        let crawler = is_search_crawler(req.user_agent());
        let public_feed = is_public_feed(&first_segment);
        let mut screening =
            Screening { verdict: Verdict::Pass, visitor: None, crawler, public_feed, first_segment };

        if is_static_asset(&req.path) {
            screening.verdict = Verdict::Passthrough;
            return screening;
        }

        if !self.honeypot_prefix.is_empty() && screening.first_segment == self.honeypot_prefix {
            self.blacklist.flag(&req.client_ip);
            screening.verdict = Verdict::Honeypot;
            return screening;
        }

        if crawler {
            return screening;
        }

        if self.blacklist.is_blacklisted(&req.client_ip) {
            screening.verdict = Verdict::Silenced;
            return screening;
        }

        if !public_feed {
            let visitor = classify(req, &self.scraper_agents);
            screening.visitor = Some(visitor);

            if let Some(decoy) = self.blackhole.capture(&req.client_ip, visitor.is_scraper_like()) {
                screening.verdict = Verdict::Blackhole(decoy);
                return screening;
            }
            if visitor == VisitorClass::Headless && self.fake_landing_enabled {
                screening.verdict =
                    Verdict::FakeLanding(fake_landing_page(&site.name, &self.honeypot_prefix));
                return screening;
            }
            if let Some(redirect) = self.sacrifice.maybe_redirect(req.user_agent(), &req.path, &site.domain) {
                screening.verdict = Verdict::Redirect(redirect.location);
                return screening;
            }
        }

        let is_scraper = is_scraper_ua(req.user_agent(), &self.scraper_agents);
        if let Err(throttled) = self.limiter.check(&req.client_ip, is_scraper) {
            log::info!("throttled {} for {}s", req.client_ip, throttled.retry_after_secs);
            screening.verdict = Verdict::Throttled(throttled);
        }
        screening
    }

    /// Apply cloaking to a rendered page. Only html reaches the transforms;
    /// crawlers and public feeds are never touched.
    pub fn finish(
        &self,
        screening: &Screening,
        content_type: &str,
        html: String,
        site: &SiteConfig,
        path: &str,
    ) -> String {
        if screening.crawler || screening.public_feed || !content_type.contains("text/html") {
            return html;
        }
        match screening.visitor {
            Some(VisitorClass::Human) => self.cloak.cloak_for_human(&html, &site.domain, &site.keyword_list()),
            Some(_) => self.cloak.cloak_for_bot(&html, &site.domain, path),
            None => html,
        }
    }
}
