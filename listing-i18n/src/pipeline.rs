//! End-to-end listing translation
//!
//! Field selection → prompt → completion → reconciliation → persistence, run
//! strictly in sequence. Nothing is written unless every earlier step
//! succeeded, so dropping the future at any point (cancellation) leaves no
//! partial write behind.

use crate::error::{TranslateError, TranslateResult};
use crate::fields::{OriginalFields, select_translatable_keys};
use crate::language::{LanguageCode, normalize_language_str};
use crate::orchestrator::{
    EditMode, ListingRecord, ListingStore, PersistenceResponse, SessionProvider,
    TranslateListingRequest, apply_translations, build_record, require_identifier,
};
use crate::prompt::build_prompt;
use crate::reconcile::{ReconciledTranslations, reconcile};
use crate::translator::CompletionService;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of detection and reconciliation for one listing
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub detected: LanguageCode,
    pub reconciled: ReconciledTranslations,
}

/// Decide the source language
///
/// The model's report wins; otherwise the user's profile language; otherwise
/// English.
pub fn resolve_detected_language(
    reported: Option<LanguageCode>,
    preferred_language: Option<&str>,
) -> LanguageCode {
    if let Some(lang) = reported {
        return lang;
    }
    if let Some(lang) = preferred_language.and_then(normalize_language_str) {
        warn!(fallback = %lang, "Model reported no usable language, using profile language");
        return lang;
    }
    warn!("Model and profile carry no usable language, defaulting to en");
    LanguageCode::En
}

/// Stateless translation pipeline, shareable across concurrent requests
#[derive(Clone)]
pub struct ListingPipeline {
    completion: Arc<dyn CompletionService>,
    timeout: Option<Duration>,
}

impl ListingPipeline {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self {
            completion,
            timeout: None,
        }
    }

    /// Abort the completion call when it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Select the translatable text of a request
    ///
    /// # Errors
    ///
    /// * `NoTranslatableContent` - title, description and eligible public data are all blank
    pub fn original_fields(request: &TranslateListingRequest) -> TranslateResult<OriginalFields> {
        let keys = select_translatable_keys(&request.listing_fields_config);
        let listing = &request.listing_data;
        let original =
            OriginalFields::from_listing(&listing.title, &listing.description, &listing.public_data, &keys);

        if !original.has_translatable_text() {
            return Err(TranslateError::NoTranslatableContent);
        }

        debug!(
            eligible_keys = keys.len(),
            structured_fields = original.structured_text.len(),
            "Translatable fields selected"
        );
        Ok(original)
    }

    /// Run the completion service and reconcile its answer
    pub async fn translate_fields(
        &self,
        original: &OriginalFields,
        preferred_language: Option<&str>,
    ) -> TranslateResult<TranslationOutcome> {
        let payload = build_prompt(original);
        let start = Instant::now();

        let completion = self.completion.complete(&payload);
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, completion)
                .await
                .map_err(|_| TranslateError::Timeout(limit))??,
            None => completion.await?,
        };

        info!(
            provider = self.completion.provider_name(),
            elapsed_ms = start.elapsed().as_millis(),
            "Completion finished"
        );

        let detected = resolve_detected_language(output.detected_language(), preferred_language);
        let reconciled = reconcile(detected, output.translations(), original);
        Ok(TranslationOutcome { detected, reconciled })
    }

    /// Translate a request and build its record without persisting it
    pub async fn preview(&self, request: &TranslateListingRequest) -> TranslateResult<ListingRecord> {
        let original = Self::original_fields(request)?;
        let outcome = self.translate_fields(&original, None).await?;
        Ok(build_record(
            &request.listing_data,
            &original,
            &outcome.reconciled,
            outcome.detected,
        ))
    }

    /// Full flow: validate, authenticate, translate, persist
    ///
    /// Validation happens before any external call, so a request with nothing
    /// to translate or an update without identifier never reaches the session,
    /// completion or persistence services.
    pub async fn translate_listing(
        &self,
        request: &TranslateListingRequest,
        session: &dyn SessionProvider,
        store: &dyn ListingStore,
    ) -> TranslateResult<PersistenceResponse> {
        let original = Self::original_fields(request)?;
        let mode = EditMode::from_flags(&request.edit_listing_mode);
        require_identifier(&request.listing_data, mode)?;

        let user = session
            .current_user()
            .await?
            .ok_or(TranslateError::Unauthenticated)?;

        info!(
            mode = ?mode,
            user_id = user.id.as_deref().unwrap_or("unknown"),
            "Translating listing"
        );

        let outcome = self
            .translate_fields(&original, user.preferred_language.as_deref())
            .await?;

        apply_translations(
            &request.listing_data,
            &original,
            &outcome.reconciled,
            outcome.detected,
            mode,
            &request.query_params,
            store,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCompletion, MockMode};
    use serde_json::json;

    #[test]
    fn test_resolve_prefers_model() {
        assert_eq!(
            resolve_detected_language(Some(LanguageCode::Fr), Some("nl")),
            LanguageCode::Fr
        );
    }

    #[test]
    fn test_resolve_falls_back_to_profile() {
        assert_eq!(resolve_detected_language(None, Some("Deutsch")), LanguageCode::De);
    }

    #[test]
    fn test_resolve_defaults_to_english() {
        assert_eq!(resolve_detected_language(None, None), LanguageCode::En);
        assert_eq!(resolve_detected_language(None, Some("klingon")), LanguageCode::En);
    }

    #[test]
    fn test_original_fields_requires_content() {
        let request: TranslateListingRequest = serde_json::from_value(json!({
            "listingData": { "title": " ", "description": "", "publicData": { "unitType": "day" } }
        }))
        .unwrap();
        assert_eq!(
            ListingPipeline::original_fields(&request),
            Err(TranslateError::NoTranslatableContent)
        );
    }

    #[tokio::test]
    async fn test_translate_fields_uses_profile_language_when_model_is_vague() {
        let mock = MockCompletion::new(MockMode::Fixed(json!({
            "detectedLanguage": "unknown",
            "translations": { "en": { "title": "Hello" } }
        })));
        let pipeline = ListingPipeline::new(Arc::new(mock));
        let original = OriginalFields {
            title: "Hallo".to_string(),
            description: String::new(),
            structured_text: Default::default(),
        };
        let outcome = pipeline.translate_fields(&original, Some("nl")).await.unwrap();
        assert_eq!(outcome.detected, LanguageCode::Nl);
        assert_eq!(outcome.reconciled.get("title", LanguageCode::Nl), Some("Hallo"));
        assert_eq!(outcome.reconciled.get("title", LanguageCode::En), Some("Hello"));
    }

    #[tokio::test]
    async fn test_translate_fields_times_out() {
        let mock = MockCompletion::with_delay(MockMode::Suffix(LanguageCode::En), 500);
        let pipeline =
            ListingPipeline::new(Arc::new(mock)).with_timeout(Duration::from_millis(10));
        let original = OriginalFields {
            title: "Hello".to_string(),
            description: String::new(),
            structured_text: Default::default(),
        };
        let result = pipeline.translate_fields(&original, None).await;
        assert_eq!(result, Err(TranslateError::Timeout(Duration::from_millis(10))));
    }
}
