//! Session bootstrap endpoint.

use serde::Serialize;

use crate::client::BackendClient;
use crate::constants::PREPARE_SESSION_PATH;
use crate::error::Result;
use crate::types::DataType;

/// Body of the prepare-session request.
///
/// Every field is optional; an empty body asks the backend to open its
/// upstream feed with whatever defaults it has.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrepareSessionRequest {
    /// Symbols the caller expects to stream.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<String>,
    /// Data types the caller expects to stream.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_types: Vec<DataType>,
}

impl BackendClient {
    /// Ask the backend to prepare a streaming session.
    ///
    /// Succeeds on any 2xx that is not an explicit non-success envelope.
    /// There is no retry; call again to re-attempt.
    ///
    /// **Endpoint:** `POST /api/websocket/connect`
    pub async fn prepare_session(&self, req: &PrepareSessionRequest) -> Result<()> {
        self.prepare_session_at(PREPARE_SESSION_PATH, req).await
    }

    /// [`prepare_session`](Self::prepare_session) against a custom path.
    pub async fn prepare_session_at(&self, path: &str, req: &PrepareSessionRequest) -> Result<()> {
        self.post_ack(path, req).await
    }
}
