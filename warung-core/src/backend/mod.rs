//! Media backend access
//!
//! [`Upstream`] is the transport seam ([`HttpUpstream`] in production, a
//! scripted fake in tests). [`MediaClient`] layers the typed operations,
//! response caching and degradation on top of it.

pub mod client;
pub mod signing;
pub mod types;
pub mod upstream;

pub use client::{BackendContext, MediaClient, Query, ALLOWED_PARAMS};
pub use types::{item_path, ApiResponse, ApiStatus};
pub use upstream::{HttpUpstream, Upstream, UpstreamRequest};
