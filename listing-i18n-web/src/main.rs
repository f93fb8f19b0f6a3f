use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use listing_i18n::{
    Config, ListingPipeline, MarketplaceClient, OpenAiProvider, PersistenceResponse,
    TranslateError, TranslateListingRequest,
};

/// Uniform error body returned for every failed request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status: u16,
    pub status_text: String,
    pub message: String,
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ListingPipeline>,
    pub marketplace_base_url: String,
    pub http: reqwest::Client,
}

pub struct ApiError(TranslateError);

impl From<TranslateError> for ApiError {
    fn from(err: TranslateError) -> Self {
        ApiError(err)
    }
}

fn status_for(err: &TranslateError) -> StatusCode {
    match err {
        TranslateError::Unauthenticated => StatusCode::UNAUTHORIZED,
        TranslateError::NoTranslatableContent
        | TranslateError::MissingIdentifier
        | TranslateError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        TranslateError::CredentialsMissing | TranslateError::ConfigError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        TranslateError::EmptyResponse
        | TranslateError::MalformedResponse(_)
        | TranslateError::ApiError { .. }
        | TranslateError::NetworkError(_)
        | TranslateError::PersistenceError(_) => StatusCode::BAD_GATEWAY,
        TranslateError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, status = %status, "Listing translation failed");
        } else {
            info!(error = %self.0, status = %status, "Listing translation rejected");
        }
        let body = ErrorResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let config_path = std::env::var("LISTING_I18N_CONFIG").ok();
    let config = Config::load(config_path.as_deref().map(std::path::Path::new), |name| {
        std::env::var(name).ok()
    })?;

    let provider = OpenAiProvider::new(&config.completion())
        .map_err(|e| format!("Failed to initialize completion provider: {}", e))?;
    if !config.has_api_key() {
        error!("No completion API key configured; translation requests will fail");
    }

    let pipeline = ListingPipeline::new(Arc::new(provider)).with_timeout(config.completion_timeout());
    let state = AppState {
        pipeline: Arc::new(pipeline),
        marketplace_base_url: config.marketplace_base_url.clone(),
        http: reqwest::Client::new(),
    };

    info!("Starting listing-i18n web server");

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server running at http://{}", config.bind_address);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/translate-listing", post(translate_listing))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

async fn translate_listing(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<PersistenceResponse>), ApiError> {
    let request = TranslateListingRequest::from_slice(&body)?;
    let marketplace = MarketplaceClient::with_client(
        &state.marketplace_base_url,
        bearer_token(&headers),
        state.http.clone(),
    );

    let response = state
        .pipeline
        .translate_listing(&request, &marketplace, &marketplace)
        .await?;

    info!(status = response.status, "Listing translation finished");

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(response)))
}
