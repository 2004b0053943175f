use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::database_ops::games::{NewGame, DEFAULT_APP_VERSION};

/// Name given to catalog entries that arrive without one.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Store platform a catalog belongs to. The tag is imposed by the source, never
/// read from the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a remote top-list. Every field is optional and loosely typed:
/// numbers and `true` are stringified (whole floats without a fraction, so
/// `2.0` becomes `"2"`), while `null`, `false`, `0`, empty strings and nested
/// values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawCatalogEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub publisher_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub store_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bundle_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Some(number_string(&n)),
        Some(Value::Bool(true)) => Some("true".to_string()),
        _ => None,
    })
}

/// Whole-valued floats drop their fraction (`2.0` -> `"2"`), matching how
/// catalog producers print numbers.
fn number_string(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Decoded shape of a catalog response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogBody {
    Flat(Vec<RawCatalogEntry>),
    /// Paged catalogs arrive as an array of pages.
    Nested(Vec<Vec<RawCatalogEntry>>),
}

impl CatalogBody {
    /// Decode a response body. The body must be a JSON array; it is `Nested`
    /// when its first element is itself an array, `Flat` otherwise.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let Value::Array(items) = value else {
            return Err(de::Error::custom("catalog body must be a JSON array"));
        };
        if matches!(items.first(), Some(Value::Array(_))) {
            // Stray non-array elements between pages are kept as one-entry pages.
            let pages = items
                .into_iter()
                .map(|page| match page {
                    Value::Array(entries) => entries_from_values(entries),
                    other => entry_from_value(other).map(|entry| vec![entry]),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CatalogBody::Nested(pages))
        } else {
            Ok(CatalogBody::Flat(entries_from_values(items)?))
        }
    }

    /// Entries in source order, flattened exactly one level.
    pub fn into_entries(self) -> Vec<RawCatalogEntry> {
        match self {
            CatalogBody::Flat(entries) => entries,
            CatalogBody::Nested(pages) => pages.into_iter().flatten().collect(),
        }
    }
}

fn entries_from_values(items: Vec<Value>) -> Result<Vec<RawCatalogEntry>, serde_json::Error> {
    items.into_iter().map(entry_from_value).collect()
}

/// Objects decode field by field; any other non-null value carries no fields
/// and becomes an empty entry. `null` entries are malformed.
fn entry_from_value(item: Value) -> Result<RawCatalogEntry, serde_json::Error> {
    match item {
        Value::Object(_) => serde_json::from_value(item),
        Value::Null => Err(de::Error::custom("catalog entry must not be null")),
        _ => Ok(RawCatalogEntry::default()),
    }
}

/// Map a raw entry onto an import candidate for `platform`.
pub fn normalize(entry: RawCatalogEntry, platform: Platform) -> NewGame {
    NewGame {
        publisher_id: entry.publisher_id,
        name: entry.name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        platform: platform.as_str().to_string(),
        store_id: entry.store_id,
        bundle_id: entry.bundle_id,
        app_version: entry
            .version
            .unwrap_or_else(|| DEFAULT_APP_VERSION.to_string()),
        is_published: true,
    }
}
