//! Remote per-site overrides served by the backend's `/config` endpoint

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::config::{SiteConfig, WarungType};
use crate::error::ConfigError;

/// Feature flags a remote override may carry
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteFeatures {
    pub has_album_route: Option<bool>,
}

/// Validated remote override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSiteConfig {
    pub warung_type: WarungType,
    pub features: RemoteFeatures,
}

#[derive(Deserialize)]
struct RawRemote {
    #[serde(default)]
    warung_type: Option<String>,
    #[serde(default)]
    features: RemoteFeatures,
}

impl RemoteSiteConfig {
    /// Validate a `/config` response envelope (`{status, data}`)
    pub fn from_envelope(payload: &Value) -> Result<Self, ConfigError> {
        if payload.get("status").and_then(Value::as_str) != Some("ok") {
            return Err(ConfigError::InvalidRemote("status is not ok".into()));
        }
        let data = payload
            .get("data")
            .filter(|d| d.is_object())
            .ok_or_else(|| ConfigError::InvalidRemote("missing data object".into()))?;
        Self::from_data(data)
    }

    /// Validate the `data` object itself
    pub fn from_data(data: &Value) -> Result<Self, ConfigError> {
        let raw: RawRemote = serde_json::from_value(data.clone())
            .map_err(|e| ConfigError::InvalidRemote(e.to_string()))?;
        let kind = raw
            .warung_type
            .ok_or_else(|| ConfigError::InvalidRemote("warung_type missing".into()))?;
        let warung_type = match kind.as_str() {
            "A" => WarungType::A,
            "B" => WarungType::B,
            "C" => WarungType::C,
            other => {
                return Err(ConfigError::InvalidRemote(format!("unknown warung_type '{}'", other)))
            }
        };
        Ok(Self { warung_type, features: raw.features })
    }
}

/// Per-request view: the cached snapshot plus any remote override.
/// The snapshot itself is never mutated.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub base: Arc<SiteConfig>,
    pub remote: Option<RemoteSiteConfig>,
}

impl EffectiveConfig {
    pub fn new(base: Arc<SiteConfig>, remote: Option<RemoteSiteConfig>) -> Self {
        Self { base, remote }
    }

    pub fn warung_type(&self) -> WarungType {
        self.remote.as_ref().map(|r| r.warung_type).unwrap_or(self.base.warung_type)
    }

    /// Content kinds listed under the category path
    pub fn content_types(&self) -> &'static [&'static str] {
        match self.warung_type() {
            WarungType::A => &["video"],
            WarungType::B => &["album"],
            WarungType::C => &["video", "album"],
        }
    }

    /// Whether album pages are served. A remote override must opt in
    /// explicitly; without one, every layout except A has them.
    pub fn album_route_allowed(&self) -> bool {
        match &self.remote {
            Some(remote) => remote.features.has_album_route == Some(true),
            None => self.base.warung_type != WarungType::A,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::SiteEnv;
    use serde_json::json;

    fn base(kind: &str) -> Arc<SiteConfig> {
        let env = SiteEnv { warung_type: Some(kind.into()), ..Default::default() };
        Arc::new(SiteConfig::assemble(&env, "example.com", "Example"))
    }

    #[test]
    fn accepts_valid_envelope() {
        let payload = json!({
            "status": "ok",
            "data": {"warung_type": "B", "features": {"has_album_route": true}}
        });
        let remote = RemoteSiteConfig::from_envelope(&payload).unwrap();
        assert_eq!(remote.warung_type, WarungType::B);
        assert_eq!(remote.features.has_album_route, Some(true));
    }

    #[test]
    fn rejects_bad_payloads() {
        assert!(RemoteSiteConfig::from_envelope(&json!({"status": "error"})).is_err());
        assert!(RemoteSiteConfig::from_envelope(&json!({"status": "ok"})).is_err());
        assert!(
            RemoteSiteConfig::from_envelope(&json!({"status": "ok", "data": {"warung_type": "D"}}))
                .is_err()
        );
        assert!(RemoteSiteConfig::from_envelope(&json!({"status": "ok", "data": {}})).is_err());
    }

    #[test]
    fn override_wins_without_touching_snapshot() {
        let snapshot = base("A");
        let remote = RemoteSiteConfig { warung_type: WarungType::C, features: RemoteFeatures::default() };
        let effective = EffectiveConfig::new(snapshot.clone(), Some(remote));
        assert_eq!(effective.warung_type(), WarungType::C);
        assert_eq!(snapshot.warung_type, WarungType::A);
        assert!(!effective.album_route_allowed());
    }

    #[test]
    fn album_route_follows_layout_without_override() {
        assert!(!EffectiveConfig::new(base("A"), None).album_route_allowed());
        assert!(EffectiveConfig::new(base("B"), None).album_route_allowed());
    }

    #[test]
    fn content_types_follow_effective_layout() {
        assert_eq!(EffectiveConfig::new(base("A"), None).content_types(), &["video"]);
        let remote = RemoteSiteConfig { warung_type: WarungType::C, features: RemoteFeatures::default() };
        assert_eq!(EffectiveConfig::new(base("A"), Some(remote)).content_types(), &["video", "album"]);
    }
}
