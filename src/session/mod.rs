//! Session Module
//!
//! Session records, the read cache and write-back buffer in front of the
//! backend, validation, and reporting.

mod cache;
mod codec;
mod factory;
mod record;
mod report;
mod stats;
mod store;
mod validator;


// Re-export public types
pub use cache::SessionCache;
pub use codec::{DecodeError, JsonCodec, RecordCodec};
pub use factory::StoreFactory;
pub use record::{
    PendingUpdate, SessionRecord, CHALLENGE_TOKEN, REMOTE_ADDR, REMOTE_USER_AGENT,
    SESSION_SOURCE, SESSION_START, USER_ID, USER_LOGIN, USER_TYPE,
};
pub use report::{ActiveSessionStats, ExpiredSessions};
pub use stats::StoreStats;
pub use store::{
    default_dialer, session_key, FlushOutcome, FlushReport, RequestOrigin, SessionStore,
    KEY_PREFIX,
};
pub use validator::{InvalidReason, SessionState};
