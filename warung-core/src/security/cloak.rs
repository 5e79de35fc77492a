//! Content cloaking
//!
//! Non-human visitors get page metadata rewritten from a rotating,
//! deterministic phrase generator. Humans get the site keywords encoded as
//! invisible CSS custom properties. Both transforms are pure functions of
//! the html and their seed inputs; [`Cloak`] adds the time buckets and the
//! profile cache.

use lazy_static::lazy_static;
use regex::{NoExpand, Regex};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use super::decoy::escape_html;
use crate::cache::{Cache, TtlCache};
use crate::clock::SharedClock;
use crate::hash::{hash_seed, Lcg};

const VOCABULARY: &[&str] = &[
    "viral", "trending", "populer", "hits", "mantap", "gratis", "online", "live", "24jam", "film",
    "video", "streaming", "nonton", "terbaru", "terlengkap", "kualitas HD", "eksklusif", "premium",
    "favorit", "update",
];

fn synonyms(word: &str) -> &'static [&'static str] {
    match word {
        "viral" => &["ramai", "banyak dicari"],
        "populer" => &["favorit", "top", "banyak ditonton"],
        "streaming" => &["nonton online", "tanpa download"],
        "terbaru" => &["paling baru", "update harian"],
        "gratis" => &["tanpa biaya", "free"],
        "eksklusif" => &["khusus", "pilihan"],
        _ => &[],
    }
}

const SYNONYM_PROBABILITY: f64 = 0.3;

const THEME_VARS: &[&str] = &[
    "--primary-color",
    "--secondary-color",
    "--font-family",
    "--spacing-unit",
    "--border-radius",
    "--transition-speed",
    "--container-width",
    "--header-height",
    "--footer-padding",
];

lazy_static! {
    static ref TITLE_TAG: Regex = Regex::new(r"<title>.*?</title>").expect("valid regex literal");
    static ref META_DESCRIPTION: Regex =
        Regex::new(r#"<meta name="description"[^>]*>"#).expect("valid regex literal");
    static ref META_KEYWORDS: Regex =
        Regex::new(r#"<meta name="keywords"[^>]*>"#).expect("valid regex literal");
}

/// Spoofed metadata for one (domain, path, minute)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnaProfile {
    pub title: String,
    pub description: String,
    pub keywords: String,
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build the spoofed metadata. Same inputs, same profile, on every instance.
pub fn dna_profile(domain: &str, path: &str, minute_bucket: u64) -> DnaProfile {
    let seed = hash_seed(&format!("{}{}{}", domain, path, minute_bucket));
    let mut swaps = Lcg::new(seed);

    let mut pick = |offset: u64| -> String {
        let idx = (u64::from(seed) + offset) % VOCABULARY.len() as u64;
        let word = VOCABULARY[idx as usize];
        let alternatives = synonyms(word);
        if swaps.next_f64() < SYNONYM_PROBABILITY && !alternatives.is_empty() {
            alternatives[swaps.next_u32() as usize % alternatives.len()].to_string()
        } else {
            word.to_string()
        }
    };

    let word_count = 3 + (seed % 3) as u64;
    let title_words: Vec<String> = (0..word_count).map(|i| pick(i * 37)).collect();
    let desc_words: Vec<String> = (0..12u64).map(|i| pick(i * 7 * 37)).collect();

    let mut order = Lcg::new(seed);
    let mut keyed: Vec<(u32, &String)> = title_words.iter().map(|w| (order.next_u32(), w)).collect();
    keyed.sort_by_key(|(key, _)| *key);
    let shuffled: Vec<&str> = keyed.iter().map(|(_, w)| w.as_str()).collect();

    let title = match seed % 6 {
        0 => shuffled.join(" "),
        1 => shuffled.join(" - "),
        2 => shuffled.join(" | "),
        3 => format!("🔥 {} 🔥", shuffled.join(" ")),
        4 => format!("{} 2025", shuffled.join(" ")),
        _ => {
            let mut words: Vec<String> = shuffled.iter().map(|w| w.to_string()).collect();
            if let Some(first) = words.first_mut() {
                *first = capitalize(first);
            }
            words.join(" ")
        }
    };

    let description = format!(
        "{}. {} {}",
        desc_words.join(" "),
        desc_words[..4].join(" "),
        desc_words[4..8].join(" ")
    );

    let mut seen = HashSet::new();
    let keywords: Vec<&str> = title_words
        .iter()
        .map(String::as_str)
        .chain(desc_words.iter().map(String::as_str))
        .chain(VOCABULARY[..5].iter().copied())
        .filter(|w| seen.insert(*w))
        .collect();

    DnaProfile {
        title: truncate_chars(&title, 70),
        description: truncate_chars(&description, 160),
        keywords: truncate_chars(&keywords.join(", "), 200),
    }
}

/// Replace the first title, description and keywords tags. Missing tags are
/// left missing.
pub fn inject_dna(html: &str, profile: &DnaProfile) -> String {
    let title = format!("<title>{}</title>", escape_html(&profile.title));
    let description =
        format!(r#"<meta name="description" content="{}">"#, escape_html(&profile.description));
    let keywords = format!(r#"<meta name="keywords" content="{}">"#, escape_html(&profile.keywords));

    let html = TITLE_TAG.replace(html, NoExpand(&title));
    let html = META_DESCRIPTION.replace(&html, NoExpand(&description));
    META_KEYWORDS.replace(&html, NoExpand(&keywords)).into_owned()
}

fn css_char(c: char) -> String {
    match c {
        '\'' => "\\'".to_string(),
        '\\' => "\\\\".to_string(),
        other => other.to_string(),
    }
}

/// Encode `keywords` as zero-size, near-transparent CSS generated content
pub fn css_stego(html: &str, domain: &str, keywords: &[String], hour_bucket: u64) -> String {
    if keywords.is_empty() {
        return html.to_string();
    }
    let seed = hash_seed(&format!("{}{}", domain, hour_bucket));
    let tag = seed % 1000;

    let mut vars = String::new();
    for (idx, name) in THEME_VARS.iter().enumerate() {
        let idx = idx as u64;
        if idx % 2 == 0 {
            let color = u64::from(seed) * idx * 7777 % 16_777_215;
            vars.push_str(&format!("{}: #{:06x};\n", name, color));
        } else {
            vars.push_str(&format!("{}: {}px;\n", name, 8 + idx % 12));
        }
    }

    let mut rules = String::new();
    let mut html = html.to_string();
    for (idx, keyword) in keywords.iter().enumerate() {
        let mut content = String::new();
        for (i, c) in keyword.chars().enumerate() {
            let var = format!("--k{}{}{}", tag, idx, i);
            vars.push_str(&format!("{}: '{}';\n", var, css_char(c)));
            content.push_str(&format!("var({})", var));
        }
        let class = format!("kw-{}-{}", tag, idx);
        rules.push_str(&format!(
            ".{}::after{{content:{};display:inline-block;width:0;height:0;opacity:0.001;pointer-events:none;position:absolute;z-index:-9999;font-size:0;line-height:0}}\n",
            class, content
        ));
        html = html.replacen(
            "</body>",
            &format!("<div class=\"{}\" aria-hidden=\"true\"></div>\n</body>", class),
            1,
        );
    }

    let style = format!("<style id=\"stego-{}\">:root{{\n{}}}\n{}</style>", seed % 10_000, vars, rules);
    html.replacen("</head>", &format!("{}\n</head>", style), 1)
}

/// Cloaking service with a TTL cache of metadata profiles
#[derive(Debug)]
pub struct Cloak {
    dna_enabled: bool,
    stego_enabled: bool,
    profiles: Mutex<TtlCache<String, DnaProfile>>,
    clock: SharedClock,
}

impl Cloak {
    pub fn new(
        dna_enabled: bool,
        stego_enabled: bool,
        capacity: usize,
        ttl: Duration,
        clock: SharedClock,
    ) -> Self {
        Self {
            dna_enabled,
            stego_enabled,
            profiles: Mutex::new(TtlCache::with_clock(capacity, ttl, clock.clone())),
            clock,
        }
    }

    /// Profile for the current minute, cached per (domain, path, minute)
    pub fn profile_for(&self, domain: &str, path: &str) -> DnaProfile {
        let minute = self.clock.now_millis() / 60_000;
        let key = format!("{}:{}:{}", domain, path, minute);
        let mut profiles = self.profiles.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = profiles.get(&key) {
            return hit.clone();
        }
        let profile = dna_profile(domain, path, minute);
        profiles.insert(key, profile.clone());
        profile
    }

    pub fn cloak_for_bot(&self, html: &str, domain: &str, path: &str) -> String {
        if !self.dna_enabled {
            return html.to_string();
        }
        inject_dna(html, &self.profile_for(domain, path))
    }

    pub fn cloak_for_human(&self, html: &str, domain: &str, keywords: &[String]) -> String {
        if !self.stego_enabled {
            return html.to_string();
        }
        let hour = self.clock.now_millis() / 3_600_000;
        css_stego(html, domain, keywords, hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const PAGE: &str = r#"<html><head><title>Real</title><meta name="description" content="real"><meta name="keywords" content="real"></head><body><p>x</p></body></html>"#;

    #[test]
    fn profile_is_deterministic_and_bounded() {
        let a = dna_profile("example.com", "/tonton/1", 28_000_000);
        let b = dna_profile("example.com", "/tonton/1", 28_000_000);
        assert_eq!(a, b);
        assert!(a.title.chars().count() <= 70);
        assert!(a.description.chars().count() <= 160);
        assert!(a.keywords.chars().count() <= 200);
        assert!(!a.title.is_empty());
    }

    #[test]
    fn keywords_are_unique() {
        let profile = dna_profile("example.com", "/", 1);
        let parts: Vec<&str> = profile.keywords.split(", ").collect();
        let unique: HashSet<&str> = parts.iter().copied().collect();
        // the last entry may be cut by truncation
        assert!(unique.len() + 1 >= parts.len());
    }

    #[test]
    fn injection_replaces_first_tags_only() {
        let profile = DnaProfile {
            title: "T <x>".into(),
            description: "D $1".into(),
            keywords: "k1, k2".into(),
        };
        let out = inject_dna(PAGE, &profile);
        assert!(out.contains("<title>T &lt;x&gt;</title>"));
        assert!(out.contains(r#"<meta name="description" content="D $1">"#));
        assert!(out.contains(r#"<meta name="keywords" content="k1, k2">"#));
        assert!(!out.contains("real"));
        assert!(out.contains("<p>x</p>"));
    }

    #[test]
    fn stego_adds_one_rule_per_keyword() {
        let keywords = vec!["film".to_string(), "it's".to_string()];
        let out = css_stego(PAGE, "example.com", &keywords, 470_000);
        assert_eq!(out.matches("aria-hidden=\"true\"></div>").count(), 2);
        assert_eq!(out.matches("::after{content:").count(), 2);
        assert!(out.contains("'\\''"));
        assert!(out.contains("--primary-color: #"));
        assert!(out.contains("--secondary-color: 9px;"));
        assert_eq!(out, css_stego(PAGE, "example.com", &keywords, 470_000));
        assert!(out.find("<style id=\"stego-").unwrap() < out.find("</head>").unwrap());
    }

    #[test]
    fn stego_without_keywords_is_identity() {
        assert_eq!(css_stego(PAGE, "example.com", &[], 1), PAGE);
    }

    #[test]
    fn disabled_cloak_passes_through() {
        let clock = ManualClock::starting_at(0);
        let cloak = Cloak::new(false, false, 10, Duration::from_secs(60), clock);
        assert_eq!(cloak.cloak_for_bot(PAGE, "example.com", "/"), PAGE);
        assert_eq!(cloak.cloak_for_human(PAGE, "example.com", &["film".into()]), PAGE);
    }

    #[test]
    fn profile_rotates_with_the_minute() {
        let clock = ManualClock::starting_at(0);
        let cloak = Cloak::new(true, true, 10, Duration::from_secs(60), clock.clone());
        let first = cloak.profile_for("example.com", "/a");
        assert_eq!(cloak.profile_for("example.com", "/a"), first);
        clock.advance(Duration::from_secs(60));
        assert_eq!(cloak.profile_for("example.com", "/a"), dna_profile("example.com", "/a", 1));
    }
}
