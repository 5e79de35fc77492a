//! Search engine indexing: IndexNow submissions and keyword landing pages

pub mod keywords;
pub mod pinger;

pub use keywords::{slugify, KeywordCatalog};
pub use pinger::{key_for, IndexNowPinger, MAX_URLS_PER_PING};
