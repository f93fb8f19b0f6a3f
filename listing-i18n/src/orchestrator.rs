//! Listing records and the persistence hand-off
//!
//! Builds the record that is written back to the marketplace: canonical
//! English title and description, and public data carrying every
//! `<field>_<language>` value plus the detected source language.

use crate::error::{TranslateError, TranslateResult};
use crate::fields::OriginalFields;
use crate::language::LanguageCode;
use crate::reconcile::ReconciledTranslations;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};
use tracing::info;

/// Public-data field written by an earlier single-shot translation flow
pub const LEGACY_TRANSLATIONS_KEY: &str = "translations";

/// Public-data field recording the detected source language
pub const DETECTED_LANGUAGE_KEY: &str = "detectedListingLanguage";

/// Non-object `listingData` reads as an empty listing
fn lenient_listing_data<'de, D>(deserializer: D) -> Result<ListingData, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).map_err(de::Error::custom),
        _ => Ok(ListingData::default()),
    }
}

/// A bare string is matched by substring, an array by exact element
fn lenient_edit_mode<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Value::String(text) if text.contains(CREATE_DRAFT_FLAG) => {
            vec![CREATE_DRAFT_FLAG.to_string()]
        }
        _ => Vec::new(),
    })
}

fn lenient_query_params<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

const CREATE_DRAFT_FLAG: &str = "createDraft";

/// Inbound request body of the translate-listing endpoint
///
/// Field shapes are coerced rather than rejected: a malformed `listingData`
/// ends up as [`TranslateError::NoTranslatableContent`] further down the
/// pipeline instead of a deserialization failure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslateListingRequest {
    #[serde(deserialize_with = "lenient_listing_data")]
    pub listing_data: ListingData,
    pub listing_fields_config: Value,
    #[serde(deserialize_with = "lenient_edit_mode")]
    pub edit_listing_mode: Vec<String>,
    #[serde(deserialize_with = "lenient_query_params")]
    pub query_params: Map<String, Value>,
}

impl TranslateListingRequest {
    /// Parse a raw request body; an empty body or `null` yields the defaults
    pub fn from_slice(body: &[u8]) -> TranslateResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| TranslateError::InvalidRequest(e.to_string()))?;
        Self::from_value(value)
    }

    /// Fails only when the top-level value is neither an object nor `null`
    pub fn from_value(value: Value) -> TranslateResult<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            value @ Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| TranslateError::InvalidRequest(e.to_string())),
            other => Err(TranslateError::InvalidRequest(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Default for TranslateListingRequest {
    fn default() -> Self {
        Self {
            listing_data: ListingData::default(),
            listing_fields_config: Value::Array(Vec::new()),
            edit_listing_mode: vec![CREATE_DRAFT_FLAG.to_string()],
            query_params: Map::new(),
        }
    }
}

/// Listing attributes as sent by the client
///
/// Attributes the pipeline does not read are kept in `attributes` and written
/// back untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingData {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub description: Value,
    #[serde(default)]
    pub public_data: Value,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ListingData {
    /// The listing identifier, ignoring `null` and empty strings
    pub fn listing_id(&self) -> Option<&Value> {
        self.id
            .as_ref()
            .filter(|id| !id.is_null() && id.as_str() != Some(""))
    }
}

/// Whether the record is created as a draft or updates an existing listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    CreateDraft,
    Update,
}

impl EditMode {
    /// Any `createDraft` flag selects the create path
    pub fn from_flags(flags: &[String]) -> Self {
        if flags.iter().any(|flag| flag == CREATE_DRAFT_FLAG) {
            EditMode::CreateDraft
        } else {
            EditMode::Update
        }
    }
}

/// Record handed to the persistence collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub title: String,
    pub description: String,
    pub public_data: Map<String, Value>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Response of the persistence collaborator, passed through verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceResponse {
    pub status: u16,
    pub status_text: String,
    pub data: Value,
}

/// The authenticated user behind a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Option<String>,
    /// Free-form language preference from the user's profile
    pub preferred_language: Option<String>,
}

/// Resolves the current user; `None` means the request is unauthenticated
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_user(&self) -> TranslateResult<Option<CurrentUser>>;
}

/// Writes listing records
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn create_draft(
        &self,
        record: &ListingRecord,
        query_params: &Map<String, Value>,
    ) -> TranslateResult<PersistenceResponse>;

    async fn update(
        &self,
        record: &ListingRecord,
        query_params: &Map<String, Value>,
    ) -> TranslateResult<PersistenceResponse>;
}

/// Drop the legacy `translations` field from existing public data
///
/// Records written by the older flow stored all translations in one nested
/// field; the flat `<field>_<language>` entries replace it. Non-object public
/// data is discarded.
pub fn strip_legacy_translations(public_data: &Value) -> Map<String, Value> {
    let mut migrated = public_data.as_object().cloned().unwrap_or_default();
    migrated.remove(LEGACY_TRANSLATIONS_KEY);
    migrated
}

/// The English title and description stored as the record's primary text
///
/// When the source is not English these are the reconciled English values,
/// which are the originals whenever the model gave no usable English text.
pub fn canonical_text(
    detected: LanguageCode,
    original: &OriginalFields,
    reconciled: &ReconciledTranslations,
) -> (String, String) {
    if detected == LanguageCode::En {
        return (original.title.clone(), original.description.clone());
    }
    let title = reconciled.get("title", LanguageCode::En).unwrap_or(&original.title);
    let description = reconciled
        .get("description", LanguageCode::En)
        .unwrap_or(&original.description);
    (title.to_string(), description.to_string())
}

/// Build the record to persist from the listing and its translations
pub fn build_record(
    listing: &ListingData,
    original: &OriginalFields,
    reconciled: &ReconciledTranslations,
    detected: LanguageCode,
) -> ListingRecord {
    let (title, description) = canonical_text(detected, original, reconciled);

    let mut public_data = strip_legacy_translations(&listing.public_data);
    for (key, text) in reconciled.iter() {
        public_data.insert(key.clone(), Value::String(text.clone()));
    }
    public_data.insert(
        DETECTED_LANGUAGE_KEY.to_string(),
        Value::String(detected.as_str().to_string()),
    );

    ListingRecord {
        id: listing.listing_id().cloned(),
        title,
        description,
        public_data,
        attributes: listing.attributes.clone(),
    }
}

/// Fail with `MissingIdentifier` when an update has nothing to update
pub fn require_identifier(listing: &ListingData, mode: EditMode) -> TranslateResult<()> {
    if mode == EditMode::Update && listing.listing_id().is_none() {
        return Err(TranslateError::MissingIdentifier);
    }
    Ok(())
}

/// Build the record and hand it to the store
///
/// The store's `{status, statusText, data}` is returned unchanged.
pub async fn apply_translations(
    listing: &ListingData,
    original: &OriginalFields,
    reconciled: &ReconciledTranslations,
    detected: LanguageCode,
    mode: EditMode,
    query_params: &Map<String, Value>,
    store: &dyn ListingStore,
) -> TranslateResult<PersistenceResponse> {
    require_identifier(listing, mode)?;

    let record = build_record(listing, original, reconciled, detected);
    let response = match mode {
        EditMode::CreateDraft => store.create_draft(&record, query_params).await?,
        EditMode::Update => store.update(&record, query_params).await?,
    };

    info!(
        mode = ?mode,
        detected_language = %detected,
        status = response.status,
        "Listing persisted"
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::reconcile;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<(&'static str, ListingRecord)>>,
    }

    #[async_trait]
    impl ListingStore for RecordingStore {
        async fn create_draft(
            &self,
            record: &ListingRecord,
            _query_params: &Map<String, Value>,
        ) -> TranslateResult<PersistenceResponse> {
            self.calls.lock().unwrap().push(("create_draft", record.clone()));
            Ok(PersistenceResponse {
                status: 200,
                status_text: "OK".to_string(),
                data: json!({ "created": true }),
            })
        }

        async fn update(
            &self,
            record: &ListingRecord,
            _query_params: &Map<String, Value>,
        ) -> TranslateResult<PersistenceResponse> {
            self.calls.lock().unwrap().push(("update", record.clone()));
            Ok(PersistenceResponse {
                status: 200,
                status_text: "OK".to_string(),
                data: json!({ "updated": true }),
            })
        }
    }

    fn original() -> OriginalFields {
        let mut structured_text = BTreeMap::new();
        structured_text.insert("manufacturer".to_string(), "Acme".to_string());
        OriginalFields {
            title: "Hallo wereld".to_string(),
            description: "Een mooi ding".to_string(),
            structured_text,
        }
    }

    fn listing(public_data: Value, id: Option<Value>) -> ListingData {
        let mut attributes = Map::new();
        attributes.insert("geolocation".to_string(), json!({ "lat": 52.1, "lng": 5.1 }));
        ListingData {
            id,
            title: json!("Hallo wereld"),
            description: json!("Een mooi ding"),
            public_data,
            attributes,
        }
    }

    // ========== Request Parsing Tests ==========

    #[test]
    fn test_request_defaults() {
        let request: TranslateListingRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(EditMode::from_flags(&request.edit_listing_mode), EditMode::CreateDraft);
        assert!(request.listing_fields_config.is_array());
        assert!(request.query_params.is_empty());
    }

    #[test]
    fn test_request_with_nulls() {
        let request: TranslateListingRequest = serde_json::from_value(json!({
            "listingData": null,
            "editListingMode": null,
            "queryParams": null
        }))
        .unwrap();
        assert!(request.listing_data.title.is_null());
        assert_eq!(EditMode::from_flags(&request.edit_listing_mode), EditMode::Update);
    }

    #[test]
    fn test_request_coerces_string_edit_mode() {
        let request = TranslateListingRequest::from_value(json!({
            "editListingMode": "createDraft"
        }))
        .unwrap();
        assert_eq!(EditMode::from_flags(&request.edit_listing_mode), EditMode::CreateDraft);

        let request = TranslateListingRequest::from_value(json!({
            "editListingMode": "mode:createDraft:new"
        }))
        .unwrap();
        assert_eq!(EditMode::from_flags(&request.edit_listing_mode), EditMode::CreateDraft);

        let request = TranslateListingRequest::from_value(json!({ "editListingMode": "edit" })).unwrap();
        assert_eq!(EditMode::from_flags(&request.edit_listing_mode), EditMode::Update);

        let request = TranslateListingRequest::from_value(json!({
            "editListingMode": [1, "createDraft"]
        }))
        .unwrap();
        assert_eq!(EditMode::from_flags(&request.edit_listing_mode), EditMode::CreateDraft);
    }

    #[test]
    fn test_request_coerces_wrong_shapes() {
        let request = TranslateListingRequest::from_value(json!({
            "listingData": "oops",
            "queryParams": [],
            "listingFieldsConfig": "nope"
        }))
        .unwrap();
        assert_eq!(request.listing_data, ListingData::default());
        assert!(request.query_params.is_empty());
        assert_eq!(request.listing_fields_config, json!("nope"));
    }

    #[test]
    fn test_request_from_slice() {
        let request = TranslateListingRequest::from_slice(b"  ").unwrap();
        assert_eq!(request, TranslateListingRequest::default());
        let request = TranslateListingRequest::from_slice(b"null").unwrap();
        assert_eq!(request, TranslateListingRequest::default());

        let request =
            TranslateListingRequest::from_slice(br#"{"listingData":{"title":"Hi"}}"#).unwrap();
        assert_eq!(request.listing_data.title, json!("Hi"));

        assert!(matches!(
            TranslateListingRequest::from_slice(b"{not json"),
            Err(TranslateError::InvalidRequest(_))
        ));
        assert_eq!(
            TranslateListingRequest::from_slice(b"[1, 2]"),
            Err(TranslateError::InvalidRequest(
                "expected a JSON object, found an array".to_string()
            ))
        );
    }

    #[test]
    fn test_listing_data_keeps_other_attributes() {
        let data: ListingData = serde_json::from_value(json!({
            "id": "abc",
            "title": "T",
            "price": { "amount": 1000, "currency": "EUR" }
        }))
        .unwrap();
        assert_eq!(data.listing_id(), Some(&json!("abc")));
        assert_eq!(data.attributes["price"]["currency"], "EUR");
    }

    #[test]
    fn test_empty_id_is_missing() {
        let data = listing(json!({}), Some(json!("")));
        assert!(data.listing_id().is_none());
        assert_eq!(
            require_identifier(&data, EditMode::Update),
            Err(TranslateError::MissingIdentifier)
        );
        assert!(require_identifier(&data, EditMode::CreateDraft).is_ok());
    }

    // ========== Legacy Migration Tests ==========

    #[test]
    fn test_strip_legacy_translations() {
        let migrated = strip_legacy_translations(&json!({
            "translations": { "nl": { "title": "old" } },
            "manufacturer": "Acme",
            "unitType": "day"
        }));
        assert!(!migrated.contains_key("translations"));
        assert_eq!(migrated["manufacturer"], "Acme");
        assert_eq!(migrated["unitType"], "day");
    }

    #[test]
    fn test_strip_legacy_translations_non_object() {
        assert!(strip_legacy_translations(&json!(null)).is_empty());
        assert!(strip_legacy_translations(&json!(["translations"])).is_empty());
    }

    // ========== Canonical Text Tests ==========

    #[test]
    fn test_canonical_text_uses_english_translation() {
        let raw = json!({ "en": { "title": "Hello world", "description": "A nice thing" } });
        let reconciled = reconcile(LanguageCode::Nl, &raw, &original());
        let (title, description) = canonical_text(LanguageCode::Nl, &original(), &reconciled);
        assert_eq!(title, "Hello world");
        assert_eq!(description, "A nice thing");
    }

    #[test]
    fn test_canonical_text_falls_back_when_english_missing() {
        let reconciled = reconcile(LanguageCode::Nl, &json!({}), &original());
        let (title, description) = canonical_text(LanguageCode::Nl, &original(), &reconciled);
        assert_eq!(title, "Hallo wereld");
        assert_eq!(description, "Een mooi ding");
    }

    #[test]
    fn test_canonical_text_for_english_source() {
        let fields = OriginalFields {
            title: "Hello".to_string(),
            description: "Nice".to_string(),
            structured_text: BTreeMap::new(),
        };
        let raw = json!({ "en": { "title": "Ignored" } });
        let reconciled = reconcile(LanguageCode::En, &raw, &fields);
        assert_eq!(
            canonical_text(LanguageCode::En, &fields, &reconciled),
            ("Hello".to_string(), "Nice".to_string())
        );
    }

    // ========== Record Tests ==========

    #[test]
    fn test_build_record_merges_public_data() {
        let data = listing(
            json!({ "translations": {"x": 1}, "unitType": "day", "manufacturer": "Acme" }),
            Some(json!("listing-1")),
        );
        let reconciled = reconcile(LanguageCode::Nl, &json!({}), &original());
        let record = build_record(&data, &original(), &reconciled, LanguageCode::Nl);

        assert_eq!(record.id, Some(json!("listing-1")));
        assert!(!record.public_data.contains_key("translations"));
        assert_eq!(record.public_data["unitType"], "day");
        assert_eq!(record.public_data["manufacturer_fr"], "Acme");
        assert_eq!(record.public_data["title_de"], "Hallo wereld");
        assert_eq!(record.public_data[DETECTED_LANGUAGE_KEY], "nl");

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["geolocation"]["lat"], 52.1);
        assert_eq!(value["publicData"]["title_nl"], "Hallo wereld");
    }

    #[test]
    fn test_record_without_id_omits_field() {
        let data = listing(json!({}), None);
        let reconciled = reconcile(LanguageCode::Nl, &json!({}), &original());
        let value =
            serde_json::to_value(build_record(&data, &original(), &reconciled, LanguageCode::Nl))
                .unwrap();
        assert!(value.get("id").is_none());
    }

    // ========== Persistence Tests ==========

    #[tokio::test]
    async fn test_apply_create_draft() {
        let store = RecordingStore::default();
        let reconciled = reconcile(LanguageCode::Nl, &json!({}), &original());
        let response = apply_translations(
            &listing(json!({}), None),
            &original(),
            &reconciled,
            LanguageCode::Nl,
            EditMode::CreateDraft,
            &Map::new(),
            &store,
        )
        .await
        .unwrap();
        assert_eq!(response.data, json!({ "created": true }));
        assert_eq!(store.calls.lock().unwrap()[0].0, "create_draft");
    }

    #[tokio::test]
    async fn test_apply_update_requires_id() {
        let store = RecordingStore::default();
        let reconciled = reconcile(LanguageCode::Nl, &json!({}), &original());
        let result = apply_translations(
            &listing(json!({}), None),
            &original(),
            &reconciled,
            LanguageCode::Nl,
            EditMode::Update,
            &Map::new(),
            &store,
        )
        .await;
        assert_eq!(result, Err(TranslateError::MissingIdentifier));
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_update() {
        let store = RecordingStore::default();
        let reconciled = reconcile(LanguageCode::Nl, &json!({}), &original());
        let response = apply_translations(
            &listing(json!({}), Some(json!("listing-1"))),
            &original(),
            &reconciled,
            LanguageCode::Nl,
            EditMode::Update,
            &Map::new(),
            &store,
        )
        .await
        .unwrap();
        assert_eq!(response.status_text, "OK");
        let calls = store.calls.lock().unwrap();
        assert_eq!(calls[0].0, "update");
        assert_eq!(calls[0].1.id, Some(json!("listing-1")));
    }
}
