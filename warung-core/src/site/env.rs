//! Raw per-deployment site inputs
//!
//! Each field mirrors one deployment variable. Nothing is interpreted here:
//! parsing and defaults happen when a [`SiteConfig`](super::SiteConfig) is
//! assembled. An empty value counts as unset.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::config::{WarungType, AD_SLOTS};

macro_rules! site_env {
    ($( $(#[$doc:meta])* $field:ident => $var:literal ),* $(,)?) => {
        /// Deployment inputs that shape a resolved site configuration
        #[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
        #[serde(default)]
        pub struct SiteEnv {
            $( $(#[$doc])* pub $field: Option<String>, )*
            /// Per-slot ad settings keyed by variable name
            /// (`ADS_HEADER_TOP_DESKTOP`, `ADS_MID_GRID_ENABLED`, ...)
            pub ads: BTreeMap<String, String>,
        }

        impl SiteEnv {
            /// Every scalar variable name, in declaration order
            pub const VARIABLES: &'static [&'static str] = &[$($var),*];

            fn slots_mut(&mut self) -> Vec<(&'static str, &mut Option<String>)> {
                vec![$(($var, &mut self.$field)),*]
            }

            /// Merge another env into this one (other's set values win)
            pub fn merge(&mut self, other: Self) {
                $(
                    if other.$field.is_some() {
                        self.$field = other.$field;
                    }
                )*
                self.ads.extend(other.ads);
            }
        }
    };
}

site_env! {
    warung_domain => "WARUNG_DOMAIN",
    warung_name => "WARUNG_NAME",
    warung_base_url => "WARUNG_BASE_URL",
    warung_tagline => "WARUNG_TAGLINE",
    /// A, B or C
    warung_type => "WARUNG_TYPE",
    dapur_base_url => "DAPUR_BASE_URL",
    dapur_api_key => "DAPUR_API_KEY",
    /// Signing key for player/download links; the API key is used when unset
    hmac_secret => "HMAC_SECRET",
    seo_default_desc => "SEO_DEFAULT_DESC",
    /// Comma-separated
    seo_keywords => "SEO_KEYWORDS",
    seo_og_image_w => "SEO_OG_IMAGE_W",
    seo_og_image_h => "SEO_OG_IMAGE_H",
    seo_twitter_site => "SEO_TWITTER_SITE",
    path_content => "PATH_CONTENT",
    path_search => "PATH_SEARCH",
    path_category => "PATH_CATEGORY",
    path_tag => "PATH_TAG",
    path_album => "PATH_ALBUM",
    path_dmca => "PATH_DMCA",
    path_terms => "PATH_TERMS",
    path_privacy => "PATH_PRIVACY",
    path_faq => "PATH_FAQ",
    path_contact => "PATH_CONTACT",
    path_about => "PATH_ABOUT",
    items_per_page => "ITEMS_PER_PAGE",
    related_count => "RELATED_COUNT",
    trending_count => "TRENDING_COUNT",
    ads_enabled => "ADS_ENABLED",
    ads_adsense_client => "ADS_ADSENSE_CLIENT",
    ads_label => "ADS_LABEL",
    ads_mid_grid_insert_after => "ADS_MID_GRID_INSERT_AFTER",
    contact_email => "CONTACT_EMAIL",
    contact_email_name => "CONTACT_EMAIL_NAME",
}

/// Suffixes of the per-slot ad variables
pub const AD_SLOT_SUFFIXES: &[&str] = &["DESKTOP", "MOBILE", "ENABLED"];

/// Treat empty strings as unset
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SiteEnv {
    /// Read every variable through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = Self::default();
        for (var, slot) in env.slots_mut() {
            if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        }
        for slot in AD_SLOTS {
            for suffix in AD_SLOT_SUFFIXES {
                let var = format!("ADS_{}_{}", slot.to_ascii_uppercase(), suffix);
                if let Some(value) = lookup(&var) {
                    env.ads.insert(var, value);
                }
            }
        }
        env
    }

    /// Read every variable from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Overlay whatever the process environment sets
    pub fn apply_env_vars(&mut self) {
        self.merge(Self::from_env());
    }

    /// Set a variable by its deployment name. Returns false for unknown names.
    pub fn set(&mut self, var: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        if var.starts_with("ADS_")
            && AD_SLOT_SUFFIXES.iter().any(|s| var.ends_with(s))
            && !Self::VARIABLES.contains(&var)
        {
            self.ads.insert(var.to_string(), value);
            return true;
        }
        for (name, slot) in self.slots_mut() {
            if name == var {
                *slot = Some(value);
                return true;
            }
        }
        false
    }

    /// Stable fingerprint of every field, used as part of the config cache key.
    /// Any change to any input yields a different signature.
    pub fn signature(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Validate values that have a fixed shape
    pub fn validate(&self) -> Result<()> {
        if let Some(kind) = non_empty(&self.warung_type) {
            if WarungType::parse(kind).is_none() {
                bail!("Invalid WARUNG_TYPE '{}': expected A, B or C", kind);
            }
        }
        let numeric = [
            ("ITEMS_PER_PAGE", &self.items_per_page),
            ("RELATED_COUNT", &self.related_count),
            ("TRENDING_COUNT", &self.trending_count),
            ("SEO_OG_IMAGE_W", &self.seo_og_image_w),
            ("SEO_OG_IMAGE_H", &self.seo_og_image_h),
            ("ADS_MID_GRID_INSERT_AFTER", &self.ads_mid_grid_insert_after),
        ];
        for (name, value) in numeric {
            if let Some(raw) = non_empty(value) {
                if raw.parse::<u32>().is_err() {
                    bail!("Invalid {} '{}': expected a non-negative integer", name, raw);
                }
            }
        }
        for (name, url) in [("WARUNG_BASE_URL", &self.warung_base_url), ("DAPUR_BASE_URL", &self.dapur_base_url)]
        {
            if let Some(raw) = non_empty(url) {
                if reqwest::Url::parse(raw).is_err() {
                    bail!("Invalid {} '{}': not an absolute URL", name, raw);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn reads_known_variables_and_ad_slots() {
        let env = SiteEnv::from_lookup(lookup_from(&[
            ("WARUNG_DOMAIN", "example.com"),
            ("PATH_CONTENT", "watch"),
            ("ADS_HEADER_TOP_DESKTOP", "<ins></ins>"),
            ("ADS_MID_GRID_ENABLED", "false"),
            ("UNRELATED", "x"),
        ]));
        assert_eq!(env.warung_domain.as_deref(), Some("example.com"));
        assert_eq!(env.path_content.as_deref(), Some("watch"));
        assert_eq!(env.ads.get("ADS_HEADER_TOP_DESKTOP").map(String::as_str), Some("<ins></ins>"));
        assert_eq!(env.ads.get("ADS_MID_GRID_ENABLED").map(String::as_str), Some("false"));
        assert_eq!(env.ads.len(), 2);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let env = SiteEnv::from_lookup(lookup_from(&[("WARUNG_NAME", "")]));
        assert_eq!(env.warung_name, None);
    }

    #[test]
    fn signature_changes_with_any_field() {
        let base = SiteEnv::default();
        let mut seen = std::collections::HashSet::new();
        seen.insert(base.signature());
        for var in SiteEnv::VARIABLES {
            let mut changed = base.clone();
            assert!(changed.set(var, "x"));
            assert!(seen.insert(changed.signature()), "{} did not change the signature", var);
        }
        let mut with_ad = base.clone();
        assert!(with_ad.set("ADS_FOOTER_TOP_MOBILE", "x"));
        assert!(seen.insert(with_ad.signature()));
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let mut base = SiteEnv { warung_domain: Some("a.com".into()), ..Default::default() };
        let other = SiteEnv { path_tag: Some("label".into()), ..Default::default() };
        base.merge(other);
        assert_eq!(base.warung_domain.as_deref(), Some("a.com"));
        assert_eq!(base.path_tag.as_deref(), Some("label"));
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let env = SiteEnv { warung_type: Some("z".into()), ..Default::default() };
        assert!(env.validate().is_err());

        let env = SiteEnv { items_per_page: Some("many".into()), ..Default::default() };
        assert!(env.validate().is_err());

        let env = SiteEnv { warung_type: Some("b".into()), ..Default::default() };
        assert!(env.validate().is_ok());
    }
}
