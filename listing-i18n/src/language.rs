//! Canonical language codes and alias normalization
//!
//! Listings are translated into a closed set of five languages. Anything a
//! completion service or a user profile reports as a language goes through
//! [`normalize_language`] before it is trusted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One of the supported listing languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Nl,
    Es,
    Fr,
    De,
}

impl LanguageCode {
    /// All supported languages in canonical order
    pub const ALL: [LanguageCode; 5] = [
        LanguageCode::En,
        LanguageCode::Nl,
        LanguageCode::Es,
        LanguageCode::Fr,
        LanguageCode::De,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Nl => "nl",
            LanguageCode::Es => "es",
            LanguageCode::Fr => "fr",
            LanguageCode::De => "de",
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Surface forms accepted for each language: ISO 639-1, ISO 639-2 (T and B),
/// English names and native names.
const LANGUAGE_ALIASES: &[(&str, LanguageCode)] = &[
    ("en", LanguageCode::En),
    ("eng", LanguageCode::En),
    ("english", LanguageCode::En),
    ("nl", LanguageCode::Nl),
    ("nld", LanguageCode::Nl),
    ("dut", LanguageCode::Nl),
    ("dutch", LanguageCode::Nl),
    ("nederlands", LanguageCode::Nl),
    ("es", LanguageCode::Es),
    ("spa", LanguageCode::Es),
    ("spanish", LanguageCode::Es),
    ("espanol", LanguageCode::Es),
    ("español", LanguageCode::Es),
    ("espana", LanguageCode::Es),
    ("fr", LanguageCode::Fr),
    ("fra", LanguageCode::Fr),
    ("fre", LanguageCode::Fr),
    ("french", LanguageCode::Fr),
    ("francais", LanguageCode::Fr),
    ("français", LanguageCode::Fr),
    ("de", LanguageCode::De),
    ("deu", LanguageCode::De),
    ("ger", LanguageCode::De),
    ("german", LanguageCode::De),
    ("deutsch", LanguageCode::De),
];

/// Map a language token to its canonical code
///
/// Trims and lowercases the input before looking it up in the alias table.
/// Returns `None` for unknown tokens.
///
/// # Example
///
/// ```ignore
/// assert_eq!(normalize_language_str(" Spanish "), Some(LanguageCode::Es));
/// assert_eq!(normalize_language_str("klingon"), None);
/// ```
pub fn normalize_language_str(input: &str) -> Option<LanguageCode> {
    let normalized = input.trim().to_lowercase();
    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, code)| *code)
}

/// Normalize an untyped value; anything other than a JSON string yields `None`
pub fn normalize_language(input: &Value) -> Option<LanguageCode> {
    input.as_str().and_then(normalize_language_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_aliases_for_same_language_agree() {
        for alias in ["ES", " spanish ", "espanol", "Español", "spa"] {
            assert_eq!(normalize_language_str(alias), Some(LanguageCode::Es), "{}", alias);
        }
        for alias in ["de", "DEU", "German", "deutsch\n"] {
            assert_eq!(normalize_language_str(alias), Some(LanguageCode::De), "{}", alias);
        }
    }

    #[test]
    fn test_every_canonical_code_maps_to_itself() {
        for code in LanguageCode::ALL {
            assert_eq!(normalize_language_str(code.as_str()), Some(code));
        }
    }

    #[test]
    fn test_unknown_tokens() {
        assert_eq!(normalize_language_str("it"), None);
        assert_eq!(normalize_language_str(""), None);
        assert_eq!(normalize_language_str("en-US"), None);
    }

    #[test]
    fn test_non_string_values() {
        assert_eq!(normalize_language(&json!(null)), None);
        assert_eq!(normalize_language(&json!(42)), None);
        assert_eq!(normalize_language(&json!(["en"])), None);
        assert_eq!(normalize_language(&json!("Dutch")), Some(LanguageCode::Nl));
    }

    #[test]
    fn test_serde_uses_lowercase_codes() {
        assert_eq!(serde_json::to_value(LanguageCode::Fr).unwrap(), json!("fr"));
        let parsed: LanguageCode = serde_json::from_value(json!("nl")).unwrap();
        assert_eq!(parsed, LanguageCode::Nl);
    }
}
