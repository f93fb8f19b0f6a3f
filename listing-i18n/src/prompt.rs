//! Instruction payload sent to the completion service
//!
//! The payload is plain data: the service receives it serialized as JSON in
//! the user message, and the same [`OriginalFields`] always produce the same
//! bytes.

use crate::error::{TranslateError, TranslateResult};
use crate::fields::OriginalFields;
use crate::language::LanguageCode;
use serde::Serialize;

/// System message sent alongside every payload
pub const SYSTEM_PROMPT: &str = "You are a translation engine. Detect source language and translate listing fields. Output valid JSON only.";

const TRANSLATION_RULES: [&str; 4] = [
    "Detect source language from all provided text.",
    "Translate to all target languages except detectedLanguage.",
    "Keep publicData keys exactly the same.",
    "Return only valid JSON, no markdown.",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSchema {
    pub detected_language: String,
    pub translations: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequestPayload {
    pub target_languages: Vec<LanguageCode>,
    pub input: OriginalFields,
    pub output_schema: OutputSchema,
    pub rules: Vec<String>,
}

impl TranslationRequestPayload {
    /// Serialize for the user message of a chat completion
    pub fn to_message(&self) -> TranslateResult<String> {
        serde_json::to_string(self)
            .map_err(|e| TranslateError::ConfigError(format!("Failed to serialize prompt: {}", e)))
    }
}

/// Build the request payload for a listing
///
/// Every supported language is a target, including the one that will turn out
/// to be the source; the reconciler discards the model's text for that one.
pub fn build_prompt(fields: &OriginalFields) -> TranslationRequestPayload {
    let codes: Vec<&str> = LanguageCode::ALL.iter().map(|code| code.as_str()).collect();

    TranslationRequestPayload {
        target_languages: LanguageCode::ALL.to_vec(),
        input: fields.clone(),
        output_schema: OutputSchema {
            detected_language: codes.join("|"),
            translations: "{ [languageCode]: { title: string, description: string, publicData: { [key]: string } } }"
                .to_string(),
        },
        rules: TRANSLATION_RULES.iter().map(|rule| rule.to_string()).collect(),
    }
}
