//! Decoy subdomain rotation for bad bots
//!
//! Bad bots are bounced with a 307 to a throwaway `sacrifice-<id>` subdomain.
//! Each identity absorbs a fixed amount of traffic ("energy"); once full it is
//! retired and a fresh one takes its place, so no single decoy host collects
//! enough reputation to matter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::patterns::{is_bad_bot, is_real_browser};
use crate::cache::{Cache, LruCache};
use crate::clock::SharedClock;
use crate::hash::hex_hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStatus {
    Active,
    Retired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SacrificeIdentity {
    /// 8 hex chars
    pub id: String,
    /// `sacrifice-<id>.<domain>`
    pub subdomain: String,
    pub domain: String,
    pub energy: u32,
    pub status: IdentityStatus,
}

/// Outcome of a redirect decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
    /// Identity the client was sent to, as it was before this redirect's
    /// energy was added
    pub identity_id: String,
}

#[derive(Debug, Clone, Copy)]
pub struct EnergyPolicy {
    pub max: u32,
    pub step: u32,
}

#[derive(Debug)]
pub struct SacrificialRedirector {
    enabled: bool,
    energy: EnergyPolicy,
    /// Keyed by subdomain
    identities: Mutex<LruCache<String, SacrificeIdentity>>,
    generation: AtomicU64,
    clock: SharedClock,
}

impl SacrificialRedirector {
    pub fn new(enabled: bool, energy: EnergyPolicy, capacity: usize, clock: SharedClock) -> Self {
        Self {
            enabled,
            energy,
            identities: Mutex::new(LruCache::new(capacity)),
            generation: AtomicU64::new(0),
            clock,
        }
    }

    fn provision(&self, domain: &str) -> SacrificeIdentity {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let id = hex_hash(&format!("{}{}{}", domain, self.clock.now_millis(), generation), 8);
        SacrificeIdentity {
            subdomain: format!("sacrifice-{}.{}", id, domain),
            id,
            domain: domain.to_string(),
            energy: 0,
            status: IdentityStatus::Active,
        }
    }

    fn active_key(identities: &LruCache<String, SacrificeIdentity>, domain: &str) -> Option<String> {
        identities
            .iter()
            .find(|(_, identity)| identity.status == IdentityStatus::Active && identity.domain == domain)
            .map(|(key, _)| key.clone())
    }

    /// The identity currently receiving traffic for `domain`
    pub fn active_identity(&self, domain: &str) -> Option<SacrificeIdentity> {
        let identities = self.identities.lock().unwrap_or_else(|e| e.into_inner());
        let key = Self::active_key(&identities, domain)?;
        identities.peek(&key).cloned()
    }

    /// Decide whether to bounce this client. Only bad-bot agents that do not
    /// also claim a real browser engine are redirected.
    pub fn maybe_redirect(&self, user_agent: &str, path: &str, domain: &str) -> Option<Redirect> {
        if !self.enabled || !is_bad_bot(user_agent) || is_real_browser(user_agent) {
            return None;
        }

        let mut identities = self.identities.lock().unwrap_or_else(|e| e.into_inner());
        let key = match Self::active_key(&identities, domain) {
            Some(key) => key,
            None => {
                let fresh = self.provision(domain);
                let key = fresh.subdomain.clone();
                identities.insert(key.clone(), fresh);
                key
            }
        };

        let identity = identities.get_mut(&key)?;
        let redirect = Redirect {
            location: format!("https://{}{}", identity.subdomain, path),
            identity_id: identity.id.clone(),
        };
        identity.energy = identity.energy.saturating_add(self.energy.step);

        if identity.energy >= self.energy.max {
            identity.status = IdentityStatus::Retired;
            log::info!("retired decoy {} at energy {}", identity.subdomain, identity.energy);
            let next = self.provision(domain);
            identities.insert(next.subdomain.clone(), next);
        }
        Some(redirect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const BOT: &str = "Mozilla/5.0 (compatible; MJ12bot/v1.4.8; http://mj12bot.com/)";
    const BROWSER_BOT: &str = "Mozilla/5.0 (compatible; AhrefsBot/7.0) Chrome/120.0";

    fn redirector() -> SacrificialRedirector {
        SacrificialRedirector::new(
            true,
            EnergyPolicy { max: 1000, step: 10 },
            50,
            ManualClock::starting_at(1_700_000_000_000),
        )
    }

    #[test]
    fn first_bad_bot_creates_an_identity() {
        let lamb = redirector();
        assert!(lamb.active_identity("example.com").is_none());

        let redirect = lamb.maybe_redirect(BOT, "/tonton/42", "example.com").unwrap();
        let identity = lamb.active_identity("example.com").unwrap();
        assert_eq!(identity.id.len(), 8);
        assert_eq!(identity.energy, 10);
        assert_eq!(redirect.location, format!("https://sacrifice-{}.example.com/tonton/42", identity.id));
    }

    #[test]
    fn identity_is_reused_until_full_then_rotated() {
        let lamb = redirector();
        let first = lamb.maybe_redirect(BOT, "/", "example.com").unwrap().identity_id;
        for _ in 1..100 {
            assert_eq!(lamb.maybe_redirect(BOT, "/", "example.com").unwrap().identity_id, first);
        }
        let next = lamb.active_identity("example.com").unwrap();
        assert_ne!(next.id, first);
        assert_eq!(next.energy, 0);
        assert_eq!(lamb.maybe_redirect(BOT, "/", "example.com").unwrap().identity_id, next.id);
    }

    #[test]
    fn browsers_and_clean_agents_are_never_redirected() {
        let lamb = redirector();
        assert!(lamb.maybe_redirect(BROWSER_BOT, "/", "example.com").is_none());
        assert!(lamb.maybe_redirect("Mozilla/5.0 Firefox/128.0", "/", "example.com").is_none());
        assert!(lamb.active_identity("example.com").is_none());
    }

    #[test]
    fn identities_are_per_domain() {
        let lamb = redirector();
        let a = lamb.maybe_redirect(BOT, "/", "a.com").unwrap();
        let b = lamb.maybe_redirect(BOT, "/", "b.com").unwrap();
        assert_ne!(a.identity_id, b.identity_id);
        assert!(b.location.ends_with(".b.com/"));
    }
}
