//! REST response envelope.
//!
//! Every backend endpoint answers `{ "status": "success", "data": ... }`.
//! Consumers must check the status before trusting `data`; use
//! [`ApiEnvelope::into_data`] for that.

use serde::Deserialize;

use crate::constants::STATUS_SUCCESS;
use crate::error::{ApiErrorBody, LiveDeskError, Result};

/// The `{ status, data, message }` wrapper around every REST payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    /// `"success"` or an error marker.
    pub status: String,
    /// Payload; only meaningful when `status == "success"`.
    pub data: Option<T>,
    /// Optional human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Whether the backend reported success.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Unwrap the payload, turning a non-success status into
    /// [`LiveDeskError::Api`].
    ///
    /// A successful envelope with no `data` field is reported as an
    /// invalid argument since there is nothing to return.
    pub fn into_data(self) -> Result<T> {
        if !self.is_success() {
            return Err(LiveDeskError::Api(ApiErrorBody {
                status: Some(self.status),
                message: self.message,
                detail: None,
            }));
        }
        self.data.ok_or_else(|| {
            LiveDeskError::InvalidArgument("success envelope carried no data".into())
        })
    }
}
