//! Service configuration: built-in defaults, an optional JSON file, then
//! environment overrides.
//!
//! The completion credential is read from `OPENAI_API_KEY`, falling back to
//! the legacy `OPEN_AI_SECRET_KEY`. A blank key counts as no key at all.

use crate::error::{TranslateError, TranslateResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Service configuration
///
/// Loaded from defaults, then an optional JSON file, then environment
/// overrides. The environment is read through an injected lookup so that
/// nothing below the binaries touches process state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub model: String,
    pub completion_base_url: String,
    pub completion_timeout_secs: u64,
    pub marketplace_base_url: String,
    pub bind_address: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            model: "gpt-4o-mini".to_string(),
            completion_base_url: "https://api.openai.com/v1".to_string(),
            completion_timeout_secs: 60,
            marketplace_base_url: "https://flex-api.sharetribe.com".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Settings handed to a completion provider at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl CompletionConfig {
    /// The API key, ignoring blank values
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Config::default().completion()
    }
}

impl Config {
    /// Load configuration from an optional JSON file plus environment overrides
    pub fn load(path: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> TranslateResult<Self> {
        let mut config = match path {
            Some(path) => {
                let data = std::fs::read_to_string(path).map_err(|e| {
                    TranslateError::ConfigError(format!("read {}: {}", path.display(), e))
                })?;
                Self::from_json(&data)?
            }
            None => Self::default(),
        };
        config.apply_env(env)?;
        Ok(config)
    }

    pub fn from_json(data: &str) -> TranslateResult<Self> {
        serde_json::from_str(data)
            .map_err(|e| TranslateError::ConfigError(format!("parse config: {}", e)))
    }

    /// Override fields from environment variables
    ///
    /// `OPENAI_API_KEY` takes precedence over the legacy `OPEN_AI_SECRET_KEY`.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> TranslateResult<()> {
        if let Some(key) = env("OPENAI_API_KEY").or_else(|| env("OPEN_AI_SECRET_KEY")) {
            self.openai_api_key = Some(key);
        }
        if let Some(model) = env("LISTING_I18N_MODEL") {
            self.model = model;
        }
        if let Some(url) = env("LISTING_I18N_COMPLETION_URL") {
            self.completion_base_url = url;
        }
        if let Some(secs) = env("LISTING_I18N_TIMEOUT_SECS") {
            self.completion_timeout_secs = secs.trim().parse().map_err(|_| {
                TranslateError::ConfigError(format!("LISTING_I18N_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        if let Some(url) = env("MARKETPLACE_API_URL") {
            self.marketplace_base_url = url;
        }
        if let Some(addr) = env("LISTING_I18N_BIND") {
            self.bind_address = addr;
        }
        Ok(())
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    /// Whether a non-blank completion API key is configured
    pub fn has_api_key(&self) -> bool {
        self.completion().credential().is_some()
    }

    pub fn completion(&self) -> CompletionConfig {
        CompletionConfig {
            api_key: self.openai_api_key.clone(),
            model: self.model.clone(),
            base_url: self.completion_base_url.clone(),
            timeout: self.completion_timeout(),
        }
    }
}
