//! Relay error taxonomy and its HTTP mapping.
//!
//! These responses are only possible before the first body byte is written;
//! after that a failure can only truncate the stream.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::upstream::UpstreamError;

#[derive(Error, Debug)]
pub enum RelayError {
    /// Credential missing or unresolvable; raised before any upstream call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider rejected the call or reported a fault.
    #[error("OpenAI API error: {0}")]
    Upstream(String),

    /// Anything else while establishing or reading the stream.
    #[error("Streaming error: {0}")]
    Internal(String),
}

impl From<UpstreamError> for RelayError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Provider { message, .. } => RelayError::Upstream(message),
            other => RelayError::Internal(other.to_string()),
        }
    }
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Upstream(_) => StatusCode::BAD_REQUEST,
            RelayError::Config(_) | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric label for this failure.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::Config(_) => "config_error",
            RelayError::Upstream(_) => "upstream_error",
            RelayError::Internal(_) => "internal_error",
        }
    }
}

/// JSON body of a pre-stream failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
