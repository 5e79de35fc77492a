//! Site configuration
//!
//! [`SiteEnv`] holds the raw deployment inputs, [`ConfigResolver`] turns them
//! into a cached, immutable [`SiteConfig`] per domain, and
//! [`EffectiveConfig`] layers the backend's remote override on top for the
//! duration of one request.

pub mod config;
pub mod env;
pub mod remote;
pub mod resolver;

pub use config::{AdSlot, AdsSettings, SeoSettings, SiteConfig, SitePaths, WarungType, AD_SLOTS};
pub use env::SiteEnv;
pub use remote::{EffectiveConfig, RemoteFeatures, RemoteSiteConfig};
pub use resolver::{subdomain_to_name, ConfigResolver};
