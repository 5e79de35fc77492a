//! Warung Edge - Core
//!
//! In-process caching and traffic shaping for the Warung edge handler, a
//! server-side front end for a content-aggregation site backed by the Dapur
//! media API.
//!
//! # Overview
//!
//! Every request goes through the same pipeline:
//!
//! 1. resolve the per-domain [`SiteConfig`](site::SiteConfig) (cached per
//!    input signature)
//! 2. screen it with the [`Gate`](security::Gate): honeypot, blacklist,
//!    visitor classification, blackhole, sacrificial redirect, rate limit
//! 3. route and render the page through the cached backend client
//! 4. cloak the html to match the visitor
//!
//! All state is bounded, lives in one [`WarungState`] per instance and is
//! never shared across instances.
//!
//! # Architecture
//!
//! - [`cache`] - LRU, LRU+TTL, stale-while-revalidate and typed fetch caches
//! - [`security`] - rate limiter, reputation, classifier and countermeasures
//! - [`site`] - site inputs, resolved snapshots and remote overrides
//! - [`backend`] - Dapur client, signed links and the upstream seam
//! - [`indexing`] - IndexNow pings and keyword landing pages
//! - [`http`] - request view, responses, rendering and the hyper server
//! - [`config`] - TOML + environment configuration
//! - [`logging`] - declarative logging on top of the `log` facade

pub mod backend;
pub mod cache;
pub mod clock;
pub mod config; // Configuration system with TOML support
pub mod error;
pub mod hash;
pub mod http;
pub mod indexing;
pub mod logging; // Declarative logging system with standard log crate integration
pub mod security;
pub mod site;
pub mod state;
pub mod tasks;

// Scripted upstream, shared with the integration tests
pub mod testing;

pub use config::WarungConfig;
pub use error::{ConfigError, Throttled, UpstreamError};
pub use state::WarungState;
