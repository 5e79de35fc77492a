//! Keyword landing pages

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::IndexingConfig;

lazy_static! {
    static ref NON_SLUG: Regex = Regex::new(r"[^a-z0-9\s]").expect("valid regex literal");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex literal");
}

/// `Film Terbaru 2024!` -> `film-terbaru-2024`
pub fn slugify(keyword: &str) -> String {
    let lowered = keyword.to_lowercase();
    let kept = NON_SLUG.replace_all(&lowered, "");
    WHITESPACE.replace_all(kept.trim(), "-").into_owned()
}

/// Configured keywords and the path their landing pages live under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordCatalog {
    keywords: Vec<String>,
    landing_path: String,
}

impl KeywordCatalog {
    pub fn new(keywords: Vec<String>, landing_path: &str) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords, landing_path: landing_path.trim_matches('/').to_string() }
    }

    pub fn from_config(config: &IndexingConfig) -> Self {
        Self::new(config.keywords.clone(), &config.landing_path)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Absolute landing url of one keyword
    pub fn url_for(&self, domain: &str, keyword: &str) -> String {
        format!("https://{}/{}/{}", domain, self.landing_path, slugify(keyword))
    }

    /// Every landing url, in keyword order
    pub fn urls(&self, domain: &str) -> Vec<String> {
        self.keywords.iter().map(|k| self.url_for(domain, k)).collect()
    }

    /// The keyword whose landing page `path` points at. Anything after the
    /// slug segment is ignored.
    pub fn match_path(&self, path: &str) -> Option<&str> {
        let prefix = format!("/{}/", self.landing_path);
        let rest = path.strip_prefix(&prefix)?;
        let slug = rest.split('/').next().unwrap_or("");
        if slug.is_empty() {
            return None;
        }
        self.keywords.iter().find(|k| slugify(k) == slug).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> KeywordCatalog {
        KeywordCatalog::new(
            vec!["Film Terbaru 2024!".into(), "  ".into(), "nonton  HD".into()],
            "/k/",
        )
    }

    #[test]
    fn slugs_strip_punctuation_and_join_words() {
        assert_eq!(slugify("Film Terbaru 2024!"), "film-terbaru-2024");
        assert_eq!(slugify("  nonton  HD "), "nonton-hd");
        assert_eq!(slugify("¡ñ!"), "");
    }

    #[test]
    fn urls_follow_keyword_order() {
        let catalog = catalog();
        assert_eq!(catalog.keywords().len(), 2);
        assert_eq!(
            catalog.urls("example.com"),
            vec!["https://example.com/k/film-terbaru-2024", "https://example.com/k/nonton-hd"]
        );
    }

    #[test]
    fn match_path_finds_the_original_keyword() {
        let catalog = catalog();
        assert_eq!(catalog.match_path("/k/nonton-hd"), Some("nonton  HD"));
        assert_eq!(catalog.match_path("/k/nonton-hd/page/2"), Some("nonton  HD"));
        assert_eq!(catalog.match_path("/k/"), None);
        assert_eq!(catalog.match_path("/k/unknown"), None);
        assert_eq!(catalog.match_path("/tag/nonton-hd"), None);
    }
}
