//! Reconciliation of model output against the original listing text
//!
//! The model's answer is advisory. For every supported language and every
//! original field this module produces exactly one value: the model's text
//! when it is a non-blank string, the original otherwise. The detected source
//! language always keeps the original, so source text never round-trips
//! through the model.

use crate::fields::OriginalFields;
use crate::language::LanguageCode;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Flat `<field>_<language>` → text mapping, ready to merge into public data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReconciledTranslations(BTreeMap<String, String>);

impl ReconciledTranslations {
    pub fn get(&self, field: &str, lang: LanguageCode) -> Option<&str> {
        self.0.get(&flat_key(field, lang)).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

static NULL: Value = Value::Null;

pub fn flat_key(field: &str, lang: LanguageCode) -> String {
    format!("{}_{}", field, lang)
}

/// Checked read: the value at `key` if it is a string with visible content
fn non_blank<'a>(candidate: &'a Value, key: &str) -> Option<&'a str> {
    candidate
        .get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

fn pick(candidate: &Value, key: &str, original: &str) -> String {
    non_blank(candidate, key).unwrap_or(original).to_string()
}

/// Merge model translations with the original fields
///
/// `raw_translations` is the untrusted `translations` mapping from the model.
/// Any shape is accepted: a missing language, a non-object language entry, or
/// a wrong-typed field falls back to the original value.
pub fn reconcile(
    detected: LanguageCode,
    raw_translations: &Value,
    original: &OriginalFields,
) -> ReconciledTranslations {
    let mut output = BTreeMap::new();

    for lang in LanguageCode::ALL {
        if lang == detected {
            output.insert(flat_key("title", lang), original.title.clone());
            output.insert(flat_key("description", lang), original.description.clone());
            for (key, text) in &original.structured_text {
                output.insert(flat_key(key, lang), text.clone());
            }
            continue;
        }

        let candidate = raw_translations.get(lang.as_str()).unwrap_or(&NULL);
        let candidate_public_data = candidate.get("publicData").unwrap_or(&NULL);

        output.insert(flat_key("title", lang), pick(candidate, "title", &original.title));
        output.insert(
            flat_key("description", lang),
            pick(candidate, "description", &original.description),
        );
        for (key, text) in &original.structured_text {
            output.insert(flat_key(key, lang), pick(candidate_public_data, key, text));
        }
    }

    ReconciledTranslations(output)
}
