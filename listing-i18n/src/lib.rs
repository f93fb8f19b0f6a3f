//! Multi-language translation of marketplace listings
//!
//! This crate detects the source language of a listing's free text, has a
//! text-completion service translate it into every supported language, and
//! merges the answer back into one record with strict fallback to the
//! original text.
//!
//! # Workflow Example
//!
//! ```ignore
//! use listing_i18n::{
//!     Config, ListingPipeline, MarketplaceClient, OpenAiProvider, TranslateListingRequest,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None, |name| std::env::var(name).ok())?;
//!
//!     // 1. Build the pipeline around a completion provider
//!     let provider = OpenAiProvider::new(&config.completion())?;
//!     let pipeline = ListingPipeline::new(Arc::new(provider))
//!         .with_timeout(config.completion_timeout());
//!
//!     // 2. Session and persistence go through the marketplace API
//!     let marketplace = MarketplaceClient::new(&config.marketplace_base_url, Some(token))?;
//!
//!     // 3. Translate and persist
//!     let request = TranslateListingRequest::from_slice(body)?;
//!     let response = pipeline
//!         .translate_listing(&request, &marketplace, &marketplace)
//!         .await?;
//!
//!     println!("{} {}", response.status, response.status_text);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fields;
pub mod language;
pub mod marketplace;
pub mod mock;
pub mod openai;
pub mod orchestrator;
pub mod pipeline;
pub mod prompt;
pub mod reconcile;
pub mod translator;


// Re-export main types for convenient access
pub use config::{CompletionConfig, Config};
pub use error::{TranslateError, TranslateResult};
pub use fields::{
    DEFAULT_TRANSLATABLE_KEYS, EXCLUDED_PUBLIC_DATA_KEYS, FieldConfigEntry, OriginalFields,
    extract_translatable_values, select_translatable_keys,
};
pub use language::{LanguageCode, normalize_language, normalize_language_str};
pub use marketplace::MarketplaceClient;
pub use mock::{MockCompletion, MockMode};
pub use openai::OpenAiProvider;
pub use orchestrator::{
    CurrentUser, EditMode, ListingData, ListingRecord, ListingStore, PersistenceResponse,
    SessionProvider, TranslateListingRequest, apply_translations, build_record, canonical_text,
    strip_legacy_translations,
};
pub use pipeline::{ListingPipeline, TranslationOutcome, resolve_detected_language};
pub use prompt::{TranslationRequestPayload, build_prompt};
pub use reconcile::{ReconciledTranslations, reconcile};
pub use translator::{CompletionService, RawModelOutput};
