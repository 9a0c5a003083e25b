//! Record Codec
//!
//! Turns a [`SessionRecord`] into the opaque blob stored under its key and back.

use serde_json::Value;

use super::record::SessionRecord;
use crate::error::{Result, SessionError};

/// Why a stored blob could not be turned back into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not parseable at all
    Malformed(String),
    /// Parsed, but not a field mapping
    NotAMapping,
}

/// Encode/decode pair for stored records. Decoding must never panic.
pub trait RecordCodec: Send + Sync {
    fn encode(&self, record: &SessionRecord) -> Result<Vec<u8>>;
    fn decode(&self, blob: &[u8]) -> std::result::Result<SessionRecord, DecodeError>;
}

/// Stores records as JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl RecordCodec for JsonCodec {
    fn encode(&self, record: &SessionRecord) -> Result<Vec<u8>> {
        serde_json::to_vec(record).map_err(|e| SessionError::Codec(e.to_string()))
    }

    fn decode(&self, blob: &[u8]) -> std::result::Result<SessionRecord, DecodeError> {
        let value: Value =
            serde_json::from_slice(blob).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Err(DecodeError::NotAMapping),
        }
    }
}
