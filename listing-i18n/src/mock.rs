//! Mock completion service for testing
//!
//! This module provides a deterministic, API-free completion service for
//! testing the listing pipeline without API keys or network access.
//!
//! # Example
//!
//! ```ignore
//! use listing_i18n::{CompletionService, LanguageCode, MockCompletion, MockMode};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockCompletion::new(MockMode::Suffix(LanguageCode::En));
//!     let output = mock.complete(&payload).await.unwrap();
//!     assert_eq!(output.translations()["fr"]["title"], "Hello world_fr");
//! }
//! ```

use crate::error::{TranslateError, TranslateResult};
use crate::language::LanguageCode;
use crate::prompt::TranslationRequestPayload;
use crate::translator::{CompletionService, RawModelOutput, parse_model_content};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock completion modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Report the given source language and translate every other target by
    /// appending the language code: "Hello" → "Hello_fr"
    Suffix(LanguageCode),

    /// Return this JSON verbatim, whatever the payload
    Fixed(Value),

    /// Simulate a service that answers with no content
    Empty,

    /// Simulate a service that answers with non-JSON text
    Malformed(String),

    /// Simulate a service failure
    Error(TranslateError),
}

/// Mock completion service that records how often it was called
#[derive(Debug, Clone)]
pub struct MockCompletion {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    calls: Arc<AtomicUsize>,
}

impl MockCompletion {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay_ms: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock with simulated network delay
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new(mode)
        }
    }

    /// Number of `complete` calls made so far, across clones
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn suffix_translations(payload: &TranslationRequestPayload, detected: LanguageCode) -> Value {
        let input = &payload.input;
        let mut translations = Map::new();

        for lang in payload.target_languages.iter().filter(|lang| **lang != detected) {
            let public_data: Map<String, Value> = input
                .structured_text
                .iter()
                .map(|(key, text)| (key.clone(), json!(format!("{}_{}", text, lang))))
                .collect();
            translations.insert(
                lang.as_str().to_string(),
                json!({
                    "title": format!("{}_{}", input.title, lang),
                    "description": format!("{}_{}", input.description, lang),
                    "publicData": public_data,
                }),
            );
        }

        json!({
            "detectedLanguage": detected.as_str(),
            "translations": translations,
        })
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(&self, payload: &TranslationRequestPayload) -> TranslateResult<RawModelOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.apply_delay().await;

        match &self.mode {
            MockMode::Suffix(detected) => {
                Ok(RawModelOutput::new(Self::suffix_translations(payload, *detected)))
            }
            MockMode::Fixed(value) => Ok(RawModelOutput::new(value.clone())),
            MockMode::Empty => parse_model_content(""),
            MockMode::Malformed(text) => parse_model_content(text),
            MockMode::Error(err) => Err(err.clone()),
        }
    }

    fn provider_name(&self) -> &str {
        "Mock Completion"
    }
}
