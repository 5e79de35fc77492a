//! Visitor classification from request headers

use super::patterns::{is_automation, is_scraper_ua};
use crate::http::RequestInfo;

/// Coarse visitor kind. Checks run in declaration order of severity:
/// headless first, then scraper, then suspicious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitorClass {
    Human,
    /// Browser claim that does not add up
    Suspicious,
    /// Known commercial crawler
    Scraper,
    /// Automation framework or spoofed rendering fingerprint
    Headless,
}

impl VisitorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitorClass::Human => "human",
            VisitorClass::Suspicious => "suspicious",
            VisitorClass::Scraper => "scraper",
            VisitorClass::Headless => "headless",
        }
    }

    /// Scrapers and headless browsers feed the blackhole
    pub fn is_scraper_like(&self) -> bool {
        matches!(self, VisitorClass::Scraper | VisitorClass::Headless)
    }
}

/// Fingerprint header set by the site's client script
pub const FINGERPRINT_HEADER: &str = "x-fp";

pub fn classify(req: &RequestInfo, scraper_agents: &[String]) -> VisitorClass {
    let ua = req.user_agent();
    let fingerprint = req.header(FINGERPRINT_HEADER);

    if is_automation(ua) || fingerprint == "0x0" || fingerprint.contains("swiftshader") {
        return VisitorClass::Headless;
    }
    if is_scraper_ua(ua, scraper_agents) {
        return VisitorClass::Scraper;
    }
    let no_client_hints = req.header("sec-ch-ua-platform").is_empty() && req.header("sec-ch-ua").is_empty();
    if (ua.contains("Chrome") && no_client_hints) || ua.chars().count() < 20 {
        return VisitorClass::Suspicious;
    }
    VisitorClass::Human
}
