//! Core HTTP client for the dashboard backend.
//!
//! The [`BackendClient`] struct wraps [`reqwest::Client`] with JSON headers
//! and provides typed `get` and `post` methods plus envelope-aware variants
//! that check `status == "success"` before handing back `data`.
//!
//! Endpoint methods are added to `BackendClient` via `impl` blocks in the
//! [`crate::api`] module.

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::constants::API_BASE_URL;
use crate::error::{ApiErrorBody, LiveDeskError, Result};
use crate::types::ApiEnvelope;

/// Core HTTP client for the dashboard backend.
///
/// Cheap to clone; clones share the underlying connection pool.
///
/// # Example
///
/// ```no_run
/// use livedesk::client::BackendClient;
///
/// # #[tokio::main]
/// # async fn main() -> livedesk::error::Result<()> {
/// let client = BackendClient::new()?;
/// let quotes: Vec<serde_json::Value> = client.get_data("/api/quotes").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    /// Base URL for REST requests (defaults to [`API_BASE_URL`]).
    base_url: String,
}

impl BackendClient {
    /// Create a client for the default local backend (`http://127.0.0.1:8001`).
    pub fn new() -> Result<Self> {
        Self::with_base_url(API_BASE_URL)
    }

    /// Create a client pointing at a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        // Validate early so a typo surfaces here and not on first request.
        url::Url::parse(&base_url)?;

        let http = reqwest::Client::builder()
            .default_headers(Self::default_headers())
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Returns a reference to the underlying `reqwest::Client`.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Generic HTTP helpers
    // -----------------------------------------------------------------------

    /// Perform a GET request and deserialize the JSON response.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");

        let resp = self.http.get(&url).send().await?;
        self.handle_response(resp).await
    }

    /// Perform a POST request with a JSON body and deserialize the response.
    pub async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");

        let resp = self.http.post(&url).json(body).send().await?;
        self.handle_response(resp).await
    }

    /// GET an enveloped endpoint and return its `data`.
    pub async fn get_data<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.get::<ApiEnvelope<R>>(path).await?.into_data()
    }

    /// POST to an enveloped endpoint and return its `data`.
    pub async fn post_data<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        self.post::<B, ApiEnvelope<R>>(path, body).await?.into_data()
    }

    /// POST where only success matters.
    ///
    /// Any 2xx counts, unless the body parses as an envelope whose status is
    /// not `"success"`. Bodies that are empty or not an envelope are ignored.
    pub async fn post_ack<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        tracing::debug!(%url, "POST (ack)");

        let resp = self.http.post(&url).json(body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(self.parse_error_body(status, &body));
        }

        match serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(&bytes) {
            Ok(env) if !env.is_success() => Err(LiveDeskError::Api(ApiErrorBody {
                status: Some(env.status),
                message: env.message,
                detail: None,
            })),
            _ => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Build the full URL from a path segment.
    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Default headers applied to every request.
    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Read a response, returning either the deserialized body or an error.
    async fn handle_response<R: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<R> {
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(LiveDeskError::Json)
        } else {
            let body = String::from_utf8_lossy(&bytes);
            Err(self.parse_error_body(status, &body))
        }
    }

    /// Try to parse the backend's JSON error structure; fall back to a raw
    /// HTTP status error.
    pub(crate) fn parse_error_body(&self, status: reqwest::StatusCode, body: &str) -> LiveDeskError {
        if let Ok(api_err) = serde_json::from_str::<ApiErrorBody>(body) {
            if api_err.is_informative() {
                return LiveDeskError::Api(api_err);
            }
        }
        LiveDeskError::HttpStatus {
            status,
            body: body.to_owned(),
        }
    }
}
