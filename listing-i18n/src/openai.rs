//! OpenAI-compatible chat completion provider
//!
//! Sends the translation payload to a `/chat/completions` endpoint in JSON
//! mode with temperature pinned to 0, and parses the first choice's content.
//!
//! # Authentication
//!
//! The API key is injected through [`CompletionConfig`]; the provider never
//! reads the environment itself. A provider without a key can be constructed,
//! but every call fails with `CredentialsMissing`.
//!
//! # Example
//!
//! ```ignore
//! use listing_i18n::{CompletionService, OpenAiProvider, build_prompt};
//!
//! let provider = OpenAiProvider::new(&config.completion())?;
//! let output = provider.complete(&build_prompt(&fields)).await?;
//! ```

use crate::config::CompletionConfig;
use crate::error::{TranslateError, TranslateResult};
use crate::prompt::{SYSTEM_PROMPT, TranslationRequestPayload};
use crate::translator::{CompletionService, RawModelOutput, parse_model_content};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat completion provider for OpenAI and API-compatible services
#[derive(Clone)]
pub struct OpenAiProvider {
    api_key: Option<String>,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a provider from explicit configuration
    ///
    /// # Errors
    ///
    /// * `ConfigError` - if the HTTP client cannot be built
    pub fn new(config: &CompletionConfig) -> TranslateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TranslateError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.credential().map(str::to_string),
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            client,
        })
    }
}

/// Pull the model's content out of a chat completion response body
///
/// Only the first choice is considered. Missing or blank content is an
/// `EmptyResponse`; content that is not JSON is a `MalformedResponse`.
pub fn parse_completion_body(body: &str) -> TranslateResult<RawModelOutput> {
    let json: Value = serde_json::from_str(body).map_err(|e| {
        TranslateError::MalformedResponse(format!("Failed to parse completion response: {}", e))
    })?;

    let content = json
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or(TranslateError::EmptyResponse)?;

    parse_model_content(content)
}

fn preview(input: &str, limit: usize) -> String {
    let cleaned = input.replace(['\n', '\r'], " ");
    let mut out: String = cleaned.chars().take(limit).collect();
    if cleaned.chars().count() > limit {
        out.push_str("...");
    }
    out
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl CompletionService for OpenAiProvider {
    async fn complete(&self, payload: &TranslationRequestPayload) -> TranslateResult<RawModelOutput> {
        let api_key = self.api_key.as_deref().ok_or(TranslateError::CredentialsMissing)?;

        let user_message = payload.to_message()?;
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            response_format: ResponseFormat { kind: "json_object" },
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: &user_message,
                },
            ],
        };

        info!(
            model = %self.model,
            prompt_len = user_message.len(),
            structured_fields = payload.input.structured_text.len(),
            "Completion request prepared"
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, elapsed_ms = start.elapsed().as_millis(), "Completion request failed");
                TranslateError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await?;
        let duration_ms = start.elapsed().as_millis();

        if !status.is_success() {
            error!(
                status = %status,
                duration_ms,
                body_preview = %preview(&body, 400),
                "Completion service returned an error"
            );
            return Err(TranslateError::ApiError {
                status: status.as_u16(),
                message: preview(&body, 400),
            });
        }

        info!(status = %status, duration_ms, "Completion response received");

        let output = parse_completion_body(&body).inspect_err(|e| {
            error!(error = %e, body_preview = %preview(&body, 400), "Completion response unusable");
        })?;

        debug!(
            detected_language = ?output.detected_language(),
            "Completion response parsed"
        );

        Ok(output)
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }
}
