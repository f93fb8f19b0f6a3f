//! Completion service trait and model output handling
//!
//! This module defines the `CompletionService` trait for provider abstraction,
//! enabling different text-completion backends (OpenAI-compatible APIs, mock)
//! to drive the listing pipeline without coupling it to any of them.
//!
//! # Example
//!
//! ```ignore
//! use listing_i18n::{CompletionService, OpenAiProvider, build_prompt};
//!
//! let provider = OpenAiProvider::new(&config)?;
//! let output = provider.complete(&build_prompt(&fields)).await?;
//! println!("{:?}", output.detected_language());
//! ```

use crate::error::{TranslateError, TranslateResult};
use crate::language::{LanguageCode, normalize_language};
use crate::prompt::TranslationRequestPayload;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Generic trait for text-completion providers
///
/// Implementations send the payload to a model and return its answer parsed
/// as JSON. They make no trust decisions about the content; that belongs to
/// the reconciler.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Ask the model to detect and translate the payload's input
    ///
    /// # Errors
    ///
    /// * `CredentialsMissing` - no credential was configured
    /// * `EmptyResponse` - the service returned no textual content
    /// * `MalformedResponse` - the content is not parseable as JSON
    async fn complete(&self, payload: &TranslationRequestPayload) -> TranslateResult<RawModelOutput>;

    /// Name of this provider, used in logs
    fn provider_name(&self) -> &str;
}

static NULL: Value = Value::Null;

/// Untrusted, parsed model output
///
/// Wraps whatever JSON the service produced. All access goes through checked
/// accessors that fall back to `Null` instead of assuming a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RawModelOutput(Value);

impl RawModelOutput {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The reported source language, if it normalizes to a supported code
    pub fn detected_language(&self) -> Option<LanguageCode> {
        self.0.get("detectedLanguage").and_then(normalize_language)
    }

    /// The per-language translations mapping, or `Null` when absent or not an object
    pub fn translations(&self) -> &Value {
        self.0
            .get("translations")
            .filter(|translations| translations.is_object())
            .unwrap_or(&NULL)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").unwrap());

/// Parse the textual content of a model answer
///
/// A single surrounding markdown code fence is stripped first, since some
/// models add one even when asked not to.
pub fn parse_model_content(content: &str) -> TranslateResult<RawModelOutput> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(TranslateError::EmptyResponse);
    }

    let body = CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    serde_json::from_str::<Value>(body)
        .map(RawModelOutput::new)
        .map_err(|e| TranslateError::MalformedResponse(e.to_string()))
}
