//! Error types for the session store
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Session Error Enum ==
/// Unified error type for the session store and its HTTP surface.
///
/// Validation failures are not represented here; they are ordinary
/// [`SessionState::Invalid`](crate::session::SessionState) values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Backend unreachable or database selection rejected
    #[error("Backend unavailable: {0}")]
    Connectivity(String),

    /// A command against an established connection failed
    #[error("Backend command failed: {0}")]
    Backend(String),

    /// Record could not be encoded
    #[error("Codec error: {0}")]
    Codec(String),

    /// A required argument was empty
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    /// Session not found
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionError::Connectivity(_) | SessionError::Backend(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SessionError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SessionError::MissingArgument(_) | SessionError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            SessionError::Connectivity(err.to_string())
        } else {
            SessionError::Backend(err.to_string())
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the session store.
pub type Result<T> = std::result::Result<T, SessionError>;
