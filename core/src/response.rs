//! Typed results decoded from the server's JSON.
//!
//! # Design
//! The server omits fields freely and its field types drift between
//! versions (numbers sent as strings, `null` for empty maps). Every field is
//! therefore `#[serde(default)]` and read through a lenient deserializer that
//! coerces what it can and falls back to the zero value otherwise. Unknown
//! fields are ignored. `from_transport_json` never fails: anything that is
//! not a JSON object decodes to `Default::default()`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::metadata::Metadata;

/// Field deserializers that never reject a value.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::{Map, Number, Value};

    pub(super) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
    }

    fn number_to_i64(n: &Number) -> i64 {
        n.as_i64()
            .or_else(|| n.as_u64().map(|v| v.min(i64::MAX as u64) as i64))
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0)
    }

    pub(super) fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => number_to_i64(&n),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
                    .unwrap_or(0)
            }
            Value::Bool(b) => i64::from(b),
            _ => 0,
        })
    }

    pub(super) fn boolean<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => b,
            Value::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
            Value::Number(n) => number_to_i64(&n) != 0,
            _ => false,
        })
    }

    pub(super) fn map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Object(m) => m,
            _ => Map::new(),
        })
    }

    pub(super) fn object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(from_object(Value::deserialize(deserializer)?))
    }

    /// Decode a struct from a JSON object only. serde would otherwise fill
    /// the fields positionally from an array.
    pub(super) fn from_object<T>(value: Value) -> T
    where
        T: DeserializeOwned + Default,
    {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => T::default(),
        }
    }

    pub(super) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items.into_iter().map(from_object).collect(),
            _ => Vec::new(),
        })
    }
}

macro_rules! transport_decoder {
    ($($ty:ty),+ $(,)?) => {$(
        impl $ty {
            /// Decode from a transport JSON body, tolerating missing,
            /// mistyped and unknown fields.
            pub fn from_transport_json(json: &Value) -> Self {
                if !json.is_object() {
                    return Self::default();
                }
                <$ty>::deserialize(json).unwrap_or_default()
            }
        }
    )+};
}

/// The relation block embedded in a hit returned by a relation search.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelationResponse {
    #[serde(deserialize_with = "lenient::string")]
    pub relation_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub relation_type: String,
    #[serde(deserialize_with = "lenient::string")]
    pub target1_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub target2_id: String,
    #[serde(deserialize_with = "lenient::map")]
    pub metadata: Metadata,
}

/// A single asset, as returned by `create`, `update` or inside search hits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssetResponse {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub permissions: String,
    #[serde(deserialize_with = "lenient::string")]
    pub highlighted_text: String,
    #[serde(deserialize_with = "lenient::string")]
    pub original_url: String,
    #[serde(deserialize_with = "lenient::string")]
    pub preview_url: String,
    #[serde(deserialize_with = "lenient::string")]
    pub thumbnail_url: String,
    #[serde(deserialize_with = "lenient::map")]
    pub metadata: Metadata,
    #[serde(deserialize_with = "lenient::object")]
    pub relation: RelationResponse,
}

impl AssetResponse {
    /// A metadata field rendered as text; `None` when absent or structured.
    pub fn metadata_text(&self, field: &str) -> Option<String> {
        match self.metadata.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn asset_path(&self) -> Option<String> {
        self.metadata_text("assetPath")
    }
}

/// A folder from the path-based folder API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FolderResponse {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub permissions: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub path: String,
    #[serde(deserialize_with = "lenient::map")]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(deserialize_with = "lenient::int")]
    pub first_result: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub max_result_hits: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub total_hits: i64,
    #[serde(deserialize_with = "lenient::list")]
    pub hits: Vec<AssetResponse>,
    #[serde(deserialize_with = "lenient::map")]
    pub facets: Map<String, Value>,
}

/// Outcome of a bulk operation (`updatebulk`, `copy`, `move`, `remove`,
/// `removeRelation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessResponse {
    #[serde(deserialize_with = "lenient::int")]
    pub processed_count: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub error_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Checkout time in milliseconds since the epoch.
    #[serde(deserialize_with = "lenient::int")]
    pub checked_out: i64,
    #[serde(deserialize_with = "lenient::string")]
    pub checked_out_by: String,
    #[serde(deserialize_with = "lenient::string")]
    pub checked_out_on_client: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(deserialize_with = "lenient::boolean")]
    pub login_success: bool,
    #[serde(deserialize_with = "lenient::string")]
    pub login_fault_message: String,
    #[serde(deserialize_with = "lenient::string")]
    pub server_version: String,
    #[serde(deserialize_with = "lenient::string")]
    pub csrf_token: String,
    #[serde(deserialize_with = "lenient::string")]
    pub auth_token: String,
}

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrowseItem {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub asset_path: String,
    #[serde(deserialize_with = "lenient::boolean")]
    pub directory: bool,
    #[serde(deserialize_with = "lenient::boolean")]
    pub collection: bool,
    #[serde(deserialize_with = "lenient::string")]
    pub permissions: String,
}

/// The children of a browsed folder. The server answers with a bare array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BrowseResponse {
    pub items: Vec<BrowseItem>,
}

impl BrowseResponse {
    pub fn from_transport_json(json: &Value) -> Self {
        let items = match json {
            Value::Array(items) => items.iter().map(BrowseItem::from_transport_json).collect(),
            _ => Vec::new(),
        };
        Self { items }
    }

    pub fn folders(&self) -> impl Iterator<Item = &BrowseItem> {
        self.items.iter().filter(|item| item.directory)
    }
}

transport_decoder!(
    RelationResponse,
    AssetResponse,
    FolderResponse,
    SearchResponse,
    ProcessResponse,
    CheckoutResponse,
    LoginResponse,
    BrowseItem,
);
