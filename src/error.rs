//! Error types for the `livedesk` crate.
//!
//! All fallible operations in this crate return [`Result<T>`], which is an
//! alias for `std::result::Result<T, LiveDeskError>`.
//!
//! [`LiveDeskError`] covers:
//! - **API errors** — A `{ status, message }` envelope whose status is not `"success"`
//! - **HTTP status errors** — Unexpected status codes with response body
//! - **HTTP transport errors** — Network, TLS, connection-refused failures
//! - **JSON errors** — Serialization and deserialization failures
//! - **WebSocket errors** — Connection and protocol errors
//! - **URL errors** — Malformed URL construction
//! - **State errors** — An operation issued in the wrong [`ConnectionState`](crate::types::ConnectionState)
//! - **Invalid arguments** — Client-side validation errors

use std::fmt;

use crate::types::ConnectionState;

/// Error body returned by the backend.
///
/// The backend answers failures either with a non-success envelope
/// (`{"status": "error", "message": "..."}`) or with a FastAPI style
/// `{"detail": "..."}` object; both shapes land here.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ApiErrorBody {
    /// Envelope status (anything other than `"success"`).
    #[serde(default)]
    pub status: Option<String>,
    /// Human-readable description of the error.
    #[serde(default)]
    pub message: Option<String>,
    /// Alternate description field.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// Whether the body carries anything worth reporting.
    pub fn is_informative(&self) -> bool {
        self.message.is_some() || self.detail.is_some()
    }
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.status.as_deref().unwrap_or("error");
        match (&self.message, &self.detail) {
            (Some(message), _) => write!(f, "[{status}] {message}"),
            (None, Some(serde_json::Value::String(detail))) => write!(f, "[{status}] {detail}"),
            (None, Some(detail)) => write!(f, "[{status}] {detail}"),
            (None, None) => write!(f, "[{status}] No message"),
        }
    }
}

/// All possible errors produced by the `livedesk` client.
#[derive(Debug, thiserror::Error)]
pub enum LiveDeskError {
    /// The backend answered with a non-success envelope.
    #[error("API error: {0}")]
    Api(ApiErrorBody),

    /// The server returned an unexpected HTTP status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code.
        status: reqwest::StatusCode,
        /// The response body text.
        body: String,
    },

    /// A network or transport-level error from `reqwest`.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to (de)serialize a JSON body or frame.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A WebSocket-level error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// An error building or parsing a URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The operation is not valid in the session's current state.
    #[error("{operation} not allowed while {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The state the session was in.
        state: ConnectionState,
    },

    /// The caller provided an invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LiveDeskError>;
