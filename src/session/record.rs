//! Session Record Module
//!
//! The ordered field mapping stored per session, and its canonical field names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Field Names ==
pub const SESSION_START: &str = "UserSessionStart";
pub const REMOTE_ADDR: &str = "UserRemoteAddr";
pub const REMOTE_USER_AGENT: &str = "UserRemoteUserAgent";
pub const CHALLENGE_TOKEN: &str = "UserChallengeToken";
pub const USER_ID: &str = "UserID";
pub const USER_LOGIN: &str = "UserLogin";
pub const USER_TYPE: &str = "UserType";
pub const SESSION_SOURCE: &str = "SessionSource";

/// Pending per-field mutations for one session.
pub type PendingUpdate = BTreeMap<String, Value>;

// == Session Record ==
/// Ordered mapping of field name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRecord {
    fields: BTreeMap<String, Value>,
}

impl SessionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field rendered as text: strings as-is, numbers and booleans formatted.
    pub fn get_str(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Field read as an integer, accepting numeric strings.
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        match self.fields.get(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Sets a field; empty names are ignored.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        if !field.is_empty() {
            self.fields.insert(field, value.into());
        }
    }

    /// True when the field exists and is neither null nor an empty string.
    pub fn has_value(&self, field: &str) -> bool {
        match self.fields.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// A record identifies a user only if it carries both `UserID` and `UserLogin`.
    pub fn is_valid(&self) -> bool {
        self.has_value(USER_ID) && self.has_value(USER_LOGIN)
    }

    /// Overrides fields with the pending update, field by field.
    pub fn merged_with(mut self, pending: Option<&PendingUpdate>) -> Self {
        if let Some(pending) = pending {
            for (field, value) in pending {
                self.fields.insert(field.clone(), value.clone());
            }
        }
        self
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for SessionRecord {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = SessionRecord::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}
