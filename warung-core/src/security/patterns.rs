//! User-agent and path patterns shared by the shield components

use lazy_static::lazy_static;
use regex::Regex;

/// Commercial SEO crawlers that get the lower rate ceiling and the blackhole
pub const DEFAULT_SCRAPER_AGENTS: &[&str] =
    &["SemrushBot", "AhrefsBot", "MJ12bot", "DotBot", "BLEXBot", "MegaIndex", "SeznamBot"];

/// Basenames the edge renders itself even though they look like static files
pub const HANDLED_FEEDS: &[&str] = &["sitemap.xml", "rss.xml", "feed.xml", "feed", "robots.txt"];

lazy_static! {
    static ref SEARCH_CRAWLER: Regex = Regex::new(
        r"(?i)Googlebot|bingbot|Slurp|DuckDuckBot|Baiduspider|YandexBot|Sogou|Exabot|facebot|ia_archiver|Google-InspectionTool"
    )
    .expect("valid regex literal");

    static ref AUTOMATION: Regex = Regex::new(
        r"(?i)HeadlessChrome|Headless|PhantomJS|SlimerJS|Scrapy|python-requests|Go-http-client|curl/|wget/"
    )
    .expect("valid regex literal");

    static ref BAD_BOT: Regex = Regex::new(
        r"(?i)SemrushBot|AhrefsBot|MJ12bot|DotBot|BLEXBot|MegaIndex|SeznamBot|spambot|scraperbot|ia_archiver"
    )
    .expect("valid regex literal");

    static ref REAL_BROWSER: Regex =
        Regex::new(r"(?i)Chrome/|Firefox/|Safari/|Edg/").expect("valid regex literal");

    static ref STATIC_ASSET: Regex = Regex::new(
        r"(?i)\.(?:css|js|mjs|map|ico|png|jpg|jpeg|gif|svg|webp|avif|woff|woff2|ttf|eot|otf|mp4|webm|ogg|mp3|wav|json|txt|xml|pdf|zip|gz|br)$"
    )
    .expect("valid regex literal");
}

/// Verified search engine crawler. These bypass the shield entirely.
pub fn is_search_crawler(ua: &str) -> bool {
    ua.contains("Googlebot")
        || ua.contains("Google-InspectionTool")
        || ua.contains("bingbot")
        || ua.contains("BingPreview")
        || SEARCH_CRAWLER.is_match(ua)
}

/// Browser automation or scripted HTTP client
pub fn is_automation(ua: &str) -> bool {
    AUTOMATION.is_match(ua)
}

/// Exact-case substring match against the configured scraper list
pub fn is_scraper_ua(ua: &str, agents: &[String]) -> bool {
    agents.iter().any(|agent| ua.contains(agent.as_str()))
}

pub fn is_bad_bot(ua: &str) -> bool {
    BAD_BOT.is_match(ua)
}

/// Claims a real browser engine
pub fn is_real_browser(ua: &str) -> bool {
    REAL_BROWSER.is_match(ua)
}

/// First path segment of a feed that stays reachable for every client
pub fn is_public_feed(first_segment: &str) -> bool {
    HANDLED_FEEDS.contains(&first_segment)
}

/// Static files are passed through untouched unless the edge renders them
pub fn is_static_asset(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    let basename = lower.rsplit('/').next().unwrap_or("");
    !HANDLED_FEEDS.contains(&basename) && STATIC_ASSET.is_match(path)
}
