//! Marketplace API client for the session and persistence collaborators
//!
//! Talks to a Marketplace-API-style REST service on behalf of the end user,
//! forwarding the bearer token of the inbound request.

use crate::error::{TranslateError, TranslateResult};
use crate::orchestrator::{CurrentUser, ListingRecord, ListingStore, PersistenceResponse, SessionProvider};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error};

const CURRENT_USER_PATH: &str = "/v1/api/current_user/show";
const CREATE_DRAFT_PATH: &str = "/v1/api/own_listings/create_draft";
const UPDATE_PATH: &str = "/v1/api/own_listings/update";

#[derive(Clone)]
pub struct MarketplaceClient {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl MarketplaceClient {
    pub fn new(base_url: &str, access_token: Option<String>) -> TranslateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TranslateError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(base_url, access_token, client))
    }

    /// Reuse an existing HTTP client (connection pool) for a new user token
    pub fn with_client(base_url: &str, access_token: Option<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.filter(|token| !token.trim().is_empty()),
            client,
        }
    }

    /// Build an endpoint URL with the request's query params appended
    ///
    /// Non-string params are encoded as their JSON text.
    pub fn endpoint(&self, path: &str, query_params: &Map<String, Value>) -> TranslateResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| TranslateError::ConfigError(format!("Invalid marketplace URL: {}", e)))?;
        if !query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query_params {
                match value {
                    Value::String(text) => pairs.append_pair(key, text),
                    other => pairs.append_pair(key, &other.to_string()),
                };
            }
        }
        Ok(url)
    }

    async fn write(
        &self,
        path: &str,
        record: &ListingRecord,
        query_params: &Map<String, Value>,
    ) -> TranslateResult<PersistenceResponse> {
        let token = self.access_token.as_deref().ok_or(TranslateError::Unauthenticated)?;
        let url = self.endpoint(path, query_params)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(record)
            .send()
            .await
            .map_err(|e| TranslateError::PersistenceError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranslateError::PersistenceError(e.to_string()))?;

        if !status.is_success() {
            error!(status = %status, path, "Marketplace write rejected");
        }

        Ok(PersistenceResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            data: parse_body(&body),
        })
    }
}

/// Response bodies are passed through; non-JSON bodies travel as a string
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Read the user from a `current_user/show` body
pub fn current_user_from_body(body: &Value) -> CurrentUser {
    let user = &body["data"];
    let id = match &user["id"] {
        Value::String(id) => Some(id.clone()),
        Value::Object(obj) => obj.get("uuid").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };
    let preferred_language = user["attributes"]["profile"]["publicData"]["language"]
        .as_str()
        .map(str::to_string);
    CurrentUser {
        id,
        preferred_language,
    }
}

impl std::fmt::Debug for MarketplaceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceClient")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[async_trait]
impl SessionProvider for MarketplaceClient {
    async fn current_user(&self) -> TranslateResult<Option<CurrentUser>> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };
        let url = self.endpoint(CURRENT_USER_PATH, &Map::new())?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| TranslateError::PersistenceError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!(status = %status, "Session rejected by marketplace");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(TranslateError::PersistenceError(format!(
                "current_user/show returned {}",
                status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslateError::PersistenceError(e.to_string()))?;
        Ok(Some(current_user_from_body(&body)))
    }
}

#[async_trait]
impl ListingStore for MarketplaceClient {
    async fn create_draft(
        &self,
        record: &ListingRecord,
        query_params: &Map<String, Value>,
    ) -> TranslateResult<PersistenceResponse> {
        self.write(CREATE_DRAFT_PATH, record, query_params).await
    }

    async fn update(
        &self,
        record: &ListingRecord,
        query_params: &Map<String, Value>,
    ) -> TranslateResult<PersistenceResponse> {
        self.write(UPDATE_PATH, record, query_params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(token: Option<&str>) -> MarketplaceClient {
        MarketplaceClient::new("http://127.0.0.1:9/", token.map(str::to_string)).unwrap()
    }

    #[test]
    fn test_endpoint_with_query_params() {
        let mut params = Map::new();
        params.insert("expand".to_string(), json!(true));
        params.insert("include".to_string(), json!("images"));
        let url = client(None).endpoint(CREATE_DRAFT_PATH, &params).unwrap();
        assert_eq!(url.path(), "/v1/api/own_listings/create_draft");
        let query = url.query().unwrap();
        assert!(query.contains("expand=true"));
        assert!(query.contains("include=images"));
    }

    #[test]
    fn test_endpoint_without_query_params() {
        let url = client(None).endpoint(UPDATE_PATH, &Map::new()).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9/v1/api/own_listings/update");
    }

    #[tokio::test]
    async fn test_no_token_is_unauthenticated_without_network() {
        assert_eq!(client(None).current_user().await, Ok(None));
        assert_eq!(client(Some("  ")).current_user().await, Ok(None));
    }

    #[test]
    fn test_current_user_from_body() {
        let body = json!({
            "data": {
                "id": { "_sdkType": "UUID", "uuid": "u-1" },
                "attributes": { "profile": { "publicData": { "language": "nl" } } }
            }
        });
        let user = current_user_from_body(&body);
        assert_eq!(user.id.as_deref(), Some("u-1"));
        assert_eq!(user.preferred_language.as_deref(), Some("nl"));
    }

    #[test]
    fn test_current_user_without_profile_language() {
        let user = current_user_from_body(&json!({ "data": { "id": "u-2" } }));
        assert_eq!(user.id.as_deref(), Some("u-2"));
        assert!(user.preferred_language.is_none());
    }

    #[test]
    fn test_parse_body_passthrough() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body(r#"{"data":1}"#), json!({ "data": 1 }));
        assert_eq!(parse_body("Bad Gateway"), json!("Bad Gateway"));
    }

    #[test]
    fn test_debug_masks_token() {
        let debug_str = format!("{:?}", client(Some("secret-token")));
        assert!(!debug_str.contains("secret-token"));
    }
}
