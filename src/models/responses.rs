//! Response DTOs for the session store API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::session::{InvalidReason, SessionRecord, SessionState, StoreStats};

/// Response body for POST /sessions
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Response body for GET /sessions/:id
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub fields: SessionRecord,
}

/// Response body for GET /sessions
#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub session_ids: Vec<String>,
}

/// Response body for PATCH /sessions/:id
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    pub session_id: String,
    /// False when the session was gone or had no expiry at write-back time
    pub written: bool,
}

/// Response body for DELETE /sessions/:id and DELETE /sessions
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
}

impl DeleteResponse {
    pub fn session(id: &str) -> Self {
        Self {
            message: format!("Session '{}' removed", id),
        }
    }

    pub fn all() -> Self {
        Self {
            message: "All sessions removed".to_string(),
        }
    }
}

/// Response body for GET /sessions/:id/validate
#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
    /// User-facing message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<SessionState> for ValidateResponse {
    fn from(state: SessionState) -> Self {
        let reason = state.reason();
        Self {
            valid: state.is_valid(),
            reason,
            message: reason.map(|r| r.user_message().to_string()),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache_hits: u64,
    pub backend_reads: u64,
    pub decode_failures: u64,
    pub flushed: u64,
    pub flush_skipped: u64,
    /// cache_hits / (cache_hits + backend_reads)
    pub hit_rate: f64,
}

impl From<StoreStats> for StatsResponse {
    fn from(stats: StoreStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            cache_hits: stats.cache_hits,
            backend_reads: stats.backend_reads,
            decode_failures: stats.decode_failures,
            flushed: stats.flushed,
            flush_skipped: stats.flush_skipped,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
