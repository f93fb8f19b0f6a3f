//! Selection of translatable listing fields
//!
//! A listing carries free text in its title, description and a bag of public
//! structured data. Only structured fields configured as public text are sent
//! to translation, and categorical fields are never sent regardless of
//! configuration.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Enumerated taxonomy fields that must never be translated
pub const EXCLUDED_PUBLIC_DATA_KEYS: [&str; 6] = [
    "listingType",
    "transactionProcessAlias",
    "unitType",
    "categoryLevel1",
    "categoryLevel2",
    "categoryLevel3",
];

/// Used when the request carries no usable field configuration
pub const DEFAULT_TRANSLATABLE_KEYS: [&str; 3] = ["attraction_name", "attraction_type", "manufacturer"];

/// One entry of the marketplace listing-field configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConfigEntry {
    pub key: String,
    pub schema_type: String,
    pub scope: String,
}

impl FieldConfigEntry {
    /// Read an entry from untyped configuration
    ///
    /// A missing `scope` defaults to `public`. Returns `None` when the entry is
    /// not an object, the key is not a non-empty string, or a present
    /// `scope`/`schemaType` is not a string.
    pub fn from_value(value: &Value) -> Option<Self> {
        let key = value.get("key")?.as_str().filter(|key| !key.is_empty())?;
        let schema_type = value.get("schemaType")?.as_str()?;
        let scope = match value.get("scope") {
            None => "public",
            Some(scope) => scope.as_str()?,
        };
        Some(Self {
            key: key.to_string(),
            schema_type: schema_type.to_string(),
            scope: scope.to_string(),
        })
    }

    pub fn is_public_text(&self) -> bool {
        self.scope == "public" && self.schema_type == "text"
    }
}

fn default_keys() -> BTreeSet<String> {
    DEFAULT_TRANSLATABLE_KEYS.iter().map(|key| key.to_string()).collect()
}

/// Derive the structured keys eligible for translation
///
/// Never returns an empty set: a non-array configuration, or one without any
/// public text entry, yields [`DEFAULT_TRANSLATABLE_KEYS`].
pub fn select_translatable_keys(field_config: &Value) -> BTreeSet<String> {
    let Some(entries) = field_config.as_array() else {
        return default_keys();
    };

    let keys: BTreeSet<String> = entries
        .iter()
        .filter_map(FieldConfigEntry::from_value)
        .filter(FieldConfigEntry::is_public_text)
        .map(|entry| entry.key)
        .collect();

    if keys.is_empty() { default_keys() } else { keys }
}

/// Pick the eligible, non-blank string values out of a listing's public data
///
/// Values are copied verbatim (not trimmed). Non-object input yields an empty map.
pub fn extract_translatable_values(
    public_data: &Value,
    keys: &BTreeSet<String>,
) -> BTreeMap<String, String> {
    let Some(public_data) = public_data.as_object() else {
        return BTreeMap::new();
    };

    public_data
        .iter()
        .filter(|(key, _)| !EXCLUDED_PUBLIC_DATA_KEYS.contains(&key.as_str()))
        .filter(|(key, _)| keys.contains(key.as_str()))
        .filter_map(|(key, value)| {
            value
                .as_str()
                .filter(|text| !text.trim().is_empty())
                .map(|text| (key.clone(), text.to_string()))
        })
        .collect()
}

/// Snapshot of the listing text that is sent to translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OriginalFields {
    pub title: String,
    pub description: String,
    #[serde(rename = "publicData")]
    pub structured_text: BTreeMap<String, String>,
}

impl OriginalFields {
    /// Build the snapshot from raw listing attributes
    ///
    /// Non-string titles and descriptions become empty strings.
    pub fn from_listing(
        title: &Value,
        description: &Value,
        public_data: &Value,
        keys: &BTreeSet<String>,
    ) -> Self {
        Self {
            title: title.as_str().unwrap_or_default().to_string(),
            description: description.as_str().unwrap_or_default().to_string(),
            structured_text: extract_translatable_values(public_data, keys),
        }
    }

    /// Whether there is anything at all worth sending to the completion service
    pub fn has_translatable_text(&self) -> bool {
        !self.title.trim().is_empty()
            || !self.description.trim().is_empty()
            || !self.structured_text.is_empty()
    }
}
