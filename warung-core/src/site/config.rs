//! Resolved, immutable per-domain site configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::env::{non_empty, SiteEnv};

/// Backend used when `DAPUR_BASE_URL` is not set
pub const DEFAULT_BACKEND_URL: &str = "https://dapur.example.com";

/// Ad placements a page may render
pub const AD_SLOTS: &[&str] = &[
    "header_top",
    "before_grid",
    "mid_grid",
    "after_grid",
    "sidebar_top",
    "sidebar_mid",
    "sidebar_bottom",
    "after_content",
    "footer_top",
];

/// Site layout family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WarungType {
    #[default]
    A,
    B,
    C,
}

impl WarungType {
    /// Case-insensitive parse; anything but A, B or C is rejected
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Some(WarungType::A),
            "B" => Some(WarungType::B),
            "C" => Some(WarungType::C),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WarungType::A => "A",
            WarungType::B => "B",
            WarungType::C => "C",
        }
    }
}

/// One ad placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdSlot {
    pub desktop: String,
    pub mobile: String,
    pub enabled: bool,
}

/// Ad settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdsSettings {
    pub enabled: bool,
    pub adsense_client: String,
    pub label: String,
    /// The mid-grid slot goes after this many items
    pub mid_grid_insert_after: u32,
    pub slots: BTreeMap<String, AdSlot>,
}

/// First path segments of each page family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePaths {
    pub content: String,
    pub search: String,
    pub category: String,
    pub tag: String,
    pub album: String,
    pub dmca: String,
    pub terms: String,
    pub privacy: String,
    pub faq: String,
    pub contact: String,
    pub about: String,
}

impl SitePaths {
    /// Slugs served as static pages
    pub fn static_pages(&self) -> [&str; 6] {
        [&self.about, &self.contact, &self.faq, &self.terms, &self.privacy, &self.dmca]
    }
}

/// SEO defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoSettings {
    pub default_description: String,
    /// Comma-separated keyword list
    pub keywords: String,
    pub lang: String,
    pub locale: String,
    pub og_image: String,
    pub og_image_width: u32,
    pub og_image_height: u32,
    pub twitter_site: String,
}

/// Everything the edge needs to know about one site. Built once per
/// (domain, inputs) pair and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub domain: String,
    pub name: String,
    pub tagline: String,
    /// Absolute site root without trailing slash
    pub base_url: String,
    /// Path prefix of `base_url`, empty when served at the root
    pub base_path: String,
    pub warung_type: WarungType,

    pub backend_url: String,
    pub api_key: String,
    pub hmac_secret: Option<String>,

    pub seo: SeoSettings,
    pub paths: SitePaths,

    pub items_per_page: u32,
    pub related_count: u32,
    pub trending_count: u32,
    pub default_thumb: String,

    pub ads: AdsSettings,

    pub contact_email: String,
    pub contact_email_name: String,
}

fn text(value: &Option<String>, default: &str) -> String {
    non_empty(value).unwrap_or(default).to_string()
}

fn number(value: &Option<String>, default: u32) -> u32 {
    non_empty(value).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn base_path_of(base_url: &str) -> String {
    reqwest::Url::parse(base_url)
        .map(|url| url.path().trim_end_matches('/').to_string())
        .unwrap_or_default()
}

impl SiteConfig {
    /// Assemble a snapshot from defaults and `env` for an already detected
    /// domain and display name
    pub fn assemble(env: &SiteEnv, domain: &str, name: &str) -> Self {
        let base_url = non_empty(&env.warung_base_url)
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://{}", domain))
            .trim_end_matches('/')
            .to_string();
        let base_path = base_path_of(&base_url);

        let slots = AD_SLOTS
            .iter()
            .map(|slot| {
                let upper = slot.to_ascii_uppercase();
                let get = |suffix: &str| env.ads.get(&format!("ADS_{}_{}", upper, suffix));
                let ad = AdSlot {
                    desktop: get("DESKTOP").cloned().unwrap_or_default(),
                    mobile: get("MOBILE").cloned().unwrap_or_default(),
                    enabled: get("ENABLED").map(|v| v != "false").unwrap_or(true),
                };
                (slot.to_string(), ad)
            })
            .collect();

        Self {
            domain: domain.to_string(),
            name: name.to_string(),
            tagline: text(&env.warung_tagline, "Streaming gratis kualitas terbaik"),
            warung_type: non_empty(&env.warung_type)
                .and_then(WarungType::parse)
                .unwrap_or_default(),
            backend_url: text(&env.dapur_base_url, DEFAULT_BACKEND_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: text(&env.dapur_api_key, ""),
            hmac_secret: non_empty(&env.hmac_secret).map(str::to_string),
            seo: SeoSettings {
                default_description: text(
                    &env.seo_default_desc,
                    "Streaming gratis kualitas terbaik. Akses mudah, tanpa registrasi.",
                ),
                keywords: text(&env.seo_keywords, "streaming, video, album, cerita, gratis"),
                lang: "id".to_string(),
                locale: "id_ID".to_string(),
                og_image: format!("{}/assets/og-default.jpg", base_url),
                og_image_width: number(&env.seo_og_image_w, 1200),
                og_image_height: number(&env.seo_og_image_h, 630),
                twitter_site: text(&env.seo_twitter_site, ""),
            },
            paths: SitePaths {
                content: text(&env.path_content, "tonton"),
                search: text(&env.path_search, "cari"),
                category: text(&env.path_category, "kategori"),
                tag: text(&env.path_tag, "tag"),
                album: text(&env.path_album, "album"),
                dmca: text(&env.path_dmca, "dmca"),
                terms: text(&env.path_terms, "terms"),
                privacy: text(&env.path_privacy, "privacy"),
                faq: text(&env.path_faq, "faq"),
                contact: text(&env.path_contact, "contact"),
                about: text(&env.path_about, "about"),
            },
            items_per_page: number(&env.items_per_page, 24),
            related_count: number(&env.related_count, 8),
            trending_count: number(&env.trending_count, 10),
            default_thumb: format!("{}/assets/no-thumb.jpg", base_url),
            ads: AdsSettings {
                enabled: non_empty(&env.ads_enabled).map(|v| v == "true").unwrap_or(true),
                adsense_client: text(&env.ads_adsense_client, ""),
                label: text(&env.ads_label, ""),
                mid_grid_insert_after: number(&env.ads_mid_grid_insert_after, 6),
                slots,
            },
            contact_email: non_empty(&env.contact_email)
                .map(str::to_string)
                .unwrap_or_else(|| format!("admin@{}", domain)),
            contact_email_name: non_empty(&env.contact_email_name)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} Admin", name)),
            base_url,
            base_path,
        }
    }

    /// SEO keywords worth encoding: trimmed, longer than one character, at most 8
    pub fn keyword_list(&self) -> Vec<String> {
        self.seo
            .keywords
            .split(',')
            .map(str::trim)
            .filter(|k| k.chars().count() > 1)
            .take(8)
            .map(str::to_string)
            .collect()
    }

    /// Absolute URL for a site-relative path
    pub fn absolute_url(&self, path: &str) -> String {
        format!("https://{}{}/{}", self.domain, self.base_path, path.trim_start_matches('/'))
    }

    /// Path with the site base path removed and no leading slash
    pub fn strip_base_path<'a>(&self, path: &'a str) -> &'a str {
        let rest = if !self.base_path.is_empty() && path.starts_with(&self.base_path) {
            &path[self.base_path.len()..]
        } else {
            path
        };
        rest.trim_start_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_bare_env() {
        let cfg = SiteConfig::assemble(&SiteEnv::default(), "example.com", "Example");
        assert_eq!(cfg.base_url, "https://example.com");
        assert_eq!(cfg.base_path, "");
        assert_eq!(cfg.warung_type, WarungType::A);
        assert_eq!(cfg.paths.content, "tonton");
        assert_eq!(cfg.items_per_page, 24);
        assert_eq!(cfg.contact_email, "admin@example.com");
        assert_eq!(cfg.contact_email_name, "Example Admin");
        assert_eq!(cfg.ads.slots.len(), AD_SLOTS.len());
        assert!(cfg.ads.slots.values().all(|slot| slot.enabled));
    }

    #[test]
    fn env_overrides_and_fallbacks() {
        let env = SiteEnv {
            warung_type: Some("c".into()),
            warung_base_url: Some("https://example.com/site/".into()),
            items_per_page: Some("not-a-number".into()),
            ads: [("ADS_MID_GRID_ENABLED".to_string(), "false".to_string())].into_iter().collect(),
            ..Default::default()
        };
        let cfg = SiteConfig::assemble(&env, "example.com", "Example");
        assert_eq!(cfg.warung_type, WarungType::C);
        assert_eq!(cfg.base_url, "https://example.com/site");
        assert_eq!(cfg.base_path, "/site");
        assert_eq!(cfg.items_per_page, 24);
        assert!(!cfg.ads.slots["mid_grid"].enabled);
        assert_eq!(cfg.strip_base_path("/site/tonton/1"), "tonton/1");
        assert_eq!(cfg.absolute_url("/k/x"), "https://example.com/site/k/x");
    }

    #[test]
    fn keyword_list_is_trimmed_and_bounded() {
        let env = SiteEnv {
            seo_keywords: Some(" a, film , video,,x,  hd ,1,2,3,4,5,6,7,8".into()),
            ..Default::default()
        };
        let cfg = SiteConfig::assemble(&env, "example.com", "Example");
        assert_eq!(cfg.keyword_list(), vec!["film", "video", "hd"]);

        let env = SiteEnv {
            seo_keywords: Some("aa,bb,cc,dd,ee,ff,gg,hh,ii,jj".into()),
            ..Default::default()
        };
        let cfg = SiteConfig::assemble(&env, "example.com", "Example");
        assert_eq!(cfg.keyword_list().len(), 8);
    }
}
