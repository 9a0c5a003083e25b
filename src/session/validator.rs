//! Session Validator
//!
//! Decides whether a session id is currently usable. Checks run in a fixed
//! order and stop at the first failure:
//!
//! 1. id present
//! 2. record found
//! 3. record names a user (`UserID` and `UserLogin`)
//! 4. request comes from the stored remote address (if enabled)
//! 5. session younger than the max lifetime
//!
//! Idle timeout is not checked here. The backend evicts idle keys on its own,
//! so an idle session fails at step 2.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use super::record::{SessionRecord, REMOTE_ADDR, SESSION_START};
use super::store::SessionStore;

// == Invalid Reason ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidReason {
    MissingId,
    NotFound,
    Malformed,
    OriginMismatch,
    Expired,
}

impl InvalidReason {
    /// Message fit to show the user. Log lines carry more detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            InvalidReason::MissingId => "Session id is missing.",
            InvalidReason::NotFound | InvalidReason::Malformed => {
                "Session invalid. Please log in again."
            }
            InvalidReason::OriginMismatch => "Session invalid. Remote address has changed.",
            InvalidReason::Expired => "Session has timed out. Please log in again.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::MissingId => "missing-id",
            InvalidReason::NotFound => "not-found",
            InvalidReason::Malformed => "malformed",
            InvalidReason::OriginMismatch => "origin-mismatch",
            InvalidReason::Expired => "expired",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Session State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Valid,
    Invalid(InvalidReason),
}

impl SessionState {
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionState::Valid)
    }

    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            SessionState::Valid => None,
            SessionState::Invalid(reason) => Some(*reason),
        }
    }
}

impl SessionStore {
    // == Validate ==
    /// Runs the validation checks for a request coming from `remote_addr`.
    ///
    /// Depending on configuration, an origin mismatch or an expired session
    /// also removes the session before returning.
    pub async fn validate(&mut self, id: &str, remote_addr: &str) -> SessionState {
        let state = self.check(id, remote_addr).await;
        self.last_invalid = state.reason();
        state
    }

    /// User-facing message of the most recent failed validation.
    pub fn last_error_message(&self) -> Option<&'static str> {
        self.last_invalid.map(|reason| reason.user_message())
    }

    pub fn last_invalid_reason(&self) -> Option<InvalidReason> {
        self.last_invalid
    }

    async fn check(&mut self, id: &str, remote_addr: &str) -> SessionState {
        if id.is_empty() {
            info!(reason = "missing-id", "Got no session id");
            return SessionState::Invalid(InvalidReason::MissingId);
        }

        let Some(record) = self.get(id).await else {
            info!(session_id = %id, reason = "not-found", "No session data for session id");
            return SessionState::Invalid(InvalidReason::NotFound);
        };

        if !record.is_valid() {
            info!(
                session_id = %id,
                reason = "malformed",
                "Session has no UserID or UserLogin"
            );
            return SessionState::Invalid(InvalidReason::Malformed);
        }

        if self.config.check_remote_addr {
            let stored = record.get_str(REMOTE_ADDR).unwrap_or_default();
            if stored != remote_addr {
                info!(
                    session_id = %id,
                    reason = "origin-mismatch",
                    stored = %stored,
                    remote_addr = %remote_addr,
                    "Remote address does not match the one the session was created from"
                );
                if self.config.remove_on_origin_mismatch {
                    self.remove_invalid(id).await;
                }
                return SessionState::Invalid(InvalidReason::OriginMismatch);
            }
        }

        let age = self.session_age(&record);
        if age > self.max_lifetime() {
            info!(
                session_id = %id,
                reason = "expired",
                age,
                max = self.config.max_session_time,
                "Session exceeded its max lifetime"
            );
            if self.config.remove_on_expiry {
                self.remove_invalid(id).await;
            }
            return SessionState::Invalid(InvalidReason::Expired);
        }

        SessionState::Valid
    }

    async fn remove_invalid(&mut self, id: &str) {
        if let Err(e) = self.remove(id).await {
            debug!(session_id = %id, error = %e, "Invalid session was not removed");
        }
    }

    /// Seconds since the session started. A start far in the past or future
    /// saturates instead of wrapping.
    pub(super) fn session_age(&self, record: &SessionRecord) -> i64 {
        let started = record.get_i64(SESSION_START).unwrap_or(0);
        self.clock.now().saturating_sub(started)
    }

    pub(super) fn max_lifetime(&self) -> i64 {
        i64::try_from(self.config.max_session_time).unwrap_or(i64::MAX)
    }
}
