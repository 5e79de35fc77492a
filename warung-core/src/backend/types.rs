//! Backend payload envelope

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::indexing::slugify;
use crate::site::SiteConfig;

/// Message shown to visitors whenever the backend could not be reached
pub const UNAVAILABLE_MESSAGE: &str = "Layanan sementara tidak tersedia.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    #[default]
    Ok,
    Error,
    #[serde(other)]
    Unknown,
}

/// `{status, data, meta}` envelope returned by every backend endpoint.
///
/// Page handlers always receive one of these: transport failures are folded
/// into an `error` envelope with empty data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub status: ApiStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "empty_data")]
    pub data: Value,
    #[serde(default = "empty_meta")]
    pub meta: Value,
}

fn empty_data() -> Value {
    Value::Array(Vec::new())
}

fn empty_meta() -> Value {
    Value::Object(Map::new())
}

impl Default for ApiResponse {
    fn default() -> Self {
        Self::empty()
    }
}

impl ApiResponse {
    /// Successful answer with nothing in it
    pub fn empty() -> Self {
        Self { status: ApiStatus::Ok, code: None, message: None, data: empty_data(), meta: empty_meta() }
    }

    /// Degraded answer for a failed call; `code` is the HTTP status or 0
    pub fn unavailable(code: u16) -> Self {
        Self {
            status: ApiStatus::Error,
            code: Some(code),
            message: Some(UNAVAILABLE_MESSAGE.to_string()),
            ..Self::empty()
        }
    }

    /// Decode a backend body. Anything that is not an object is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    pub fn is_error(&self) -> bool {
        self.status == ApiStatus::Error
    }

    /// `data` as a list; a single object counts as one item
    pub fn items(&self) -> Vec<Value> {
        match &self.data {
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            other => vec![other.clone()],
        }
    }
}

/// Site path of a listed item: `<base>/<section>/<id>[/<slug>]`, where the
/// section is the album path for albums and the content path otherwise
pub fn item_path(item: &Value, site: &SiteConfig) -> String {
    fn field<'a>(item: &'a Value, name: &str) -> &'a str {
        item.get(name).and_then(Value::as_str).unwrap_or("")
    }
    let id = item.get("id").and_then(Value::as_i64).unwrap_or(0);
    let section = if field(item, "type") == "album" { &site.paths.album } else { &site.paths.content };
    let slug = slugify(field(item, "title"));
    if slug.is_empty() {
        format!("{}/{}/{}", site.base_path, section, id)
    } else {
        format!("{}/{}/{}/{}", site.base_path, section, id, slug)
    }
}
