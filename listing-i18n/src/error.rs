/// Error types for the listing translation pipeline
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// No current user could be resolved for the request
    Unauthenticated,
    /// Title, description and every eligible structured field are blank
    NoTranslatableContent,
    /// The completion service has no configured credential
    CredentialsMissing,
    /// The completion service returned no textual content
    EmptyResponse,
    /// The completion service returned content that is not valid JSON
    MalformedResponse(String),
    /// Update mode was requested without a listing identifier
    MissingIdentifier,
    /// The completion call did not finish within the caller's deadline
    Timeout(Duration),
    /// Transport-level failure talking to an external service
    NetworkError(String),
    /// The completion service answered with a non-success status
    ApiError { status: u16, message: String },
    /// The persistence or session service could not be reached or decoded
    PersistenceError(String),
    /// Invalid configuration value
    ConfigError(String),
    /// The inbound request body is not a JSON object
    InvalidRequest(String),
}

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslateError::Unauthenticated => write!(f, "Unauthorized."),
            TranslateError::NoTranslatableContent => write!(
                f,
                "No translatable text found in title, description, or publicData."
            ),
            TranslateError::CredentialsMissing => write!(f, "Missing Credentials."),
            TranslateError::EmptyResponse => write!(f, "Empty response from completion service."),
            TranslateError::MalformedResponse(msg) => write!(f, "Invalid JSON: {}", msg),
            TranslateError::MissingIdentifier => write!(f, "Missing listingId for update mode."),
            TranslateError::Timeout(after) => {
                write!(f, "Completion service timed out after {}ms", after.as_millis())
            }
            TranslateError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            TranslateError::ApiError { status, message } => {
                write!(f, "Completion service error ({}): {}", status, message)
            }
            TranslateError::PersistenceError(msg) => write!(f, "Persistence error: {}", msg),
            TranslateError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            TranslateError::InvalidRequest(msg) => write!(f, "Invalid request body: {}", msg),
        }
    }
}

impl std::error::Error for TranslateError {}

impl From<reqwest::Error> for TranslateError {
    fn from(err: reqwest::Error) -> Self {
        TranslateError::NetworkError(err.to_string())
    }
}

/// Result type for pipeline operations
pub type TranslateResult<T> = Result<T, TranslateError>;
