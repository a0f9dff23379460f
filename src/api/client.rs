//! RAG backend HTTP client
//!
//! Provides a structured HTTP client for the backend with:
//! - Request/response serialization
//! - Error handling with network vs API vs parse distinction
//! - No retries: every call is attempted exactly once

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::types::{
    FacetsResponse, GenerateRequest, GenerateResponse, HealthResponse, SearchRequest,
    SearchResponse, StatsResponse,
};

// =============================================================================
// Error Types
// =============================================================================

/// Backend call errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network error (connection failed, timeout, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx responses)
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Malformed or unexpected response body
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl ApiError {
    /// HTTP status of an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Body FastAPI-style backends return on errors
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

// =============================================================================
// RAG API Client
// =============================================================================

/// Client for the RAG backend endpoints
#[derive(Debug, Clone)]
pub struct RagApiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl RagApiClient {
    /// Default backend base URL
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8000";

    /// Create a new client for `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(base_url, None)
    }

    /// Create client with an optional per-request timeout
    pub fn with_config(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Build a client from application configuration
    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self::with_config(config.api_base_url(), config.request_timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /search`
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        self.post_json("/search", request).await
    }

    /// `POST /search/agentic`
    pub async fn agentic_search(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResponse, ApiError> {
        self.post_json("/search/agentic", request).await
    }

    /// `POST /generate`
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        self.post_json("/generate", request).await
    }

    /// `GET /stats`
    pub async fn stats(&self) -> Result<StatsResponse, ApiError> {
        self.get_json("/stats").await
    }

    /// `GET /facets`
    pub async fn facets(&self) -> Result<FacetsResponse, ApiError> {
        self.get_json("/facets").await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.get_json("/health").await
    }

    /// Whether the backend answers `/health` with an ok status
    pub async fn test_connection(&self) -> bool {
        match self.health().await {
            Ok(health) => health.is_ok(),
            Err(e) => {
                tracing::debug!("Connection test against {} failed: {}", self.base_url, e);
                false
            }
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: Self::error_message(&response_text, status),
            });
        }

        serde_json::from_str(&response_text)
            .map_err(|e| ApiError::Parse(format!("{}: {}", e, response_text)))
    }

    fn error_message(body: &str, status: reqwest::StatusCode) -> String {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            });

        match detail {
            Some(detail) => detail,
            None if !body.trim().is_empty() => body.to_string(),
            None => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        }
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
