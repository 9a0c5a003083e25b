//! Request DTOs for the session store API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Request body for creating a session (POST /sessions)
///
/// # Fields
/// - `fields`: Caller fields stored with the session, typically `UserID`,
///   `UserLogin` and `UserType`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Request body for buffering a field update (PATCH /sessions/:id)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSessionRequest {
    /// Field to set
    pub field: String,
    /// New value
    pub value: Value,
}

impl UpdateSessionRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.field.is_empty() {
            return Some("Field name cannot be empty".to_string());
        }
        None
    }
}

/// Query string of GET /sessions/:id/validate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateQuery {
    /// Remote address of the request being checked; falls back to request headers
    #[serde(default)]
    pub remote_addr: Option<String>,
}

/// Query string of GET /reports/active
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveSessionsQuery {
    #[serde(default = "default_user_type")]
    pub user_type: String,
}

fn default_user_type() -> String {
    "User".to_string()
}
