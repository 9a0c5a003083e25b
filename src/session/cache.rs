//! Session Cache Module
//!
//! Two-tier lookup kept per store instance: a read cache of records as last
//! fetched from the backend, and a write-back buffer of pending field updates.
//!
//! Precedence: a read returns the cached record with every pending field laid
//! over it. Pending fields always win.

use std::collections::HashMap;

use serde_json::Value;

use super::record::{PendingUpdate, SessionRecord};

// == Session Cache ==
#[derive(Debug, Default)]
pub struct SessionCache {
    /// Last record read from the backend, per session id
    records: HashMap<String, SessionRecord>,
    /// Buffered field updates not yet written back, per session id
    pending: HashMap<String, PendingUpdate>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    // == Lookup ==
    /// Cached record merged with its pending update, if a record is cached.
    pub fn lookup(&self, id: &str) -> Option<SessionRecord> {
        self.records
            .get(id)
            .map(|record| record.clone().merged_with(self.pending.get(id)))
    }

    // == Fill ==
    /// Caches a freshly fetched record and returns the merged view of it.
    pub fn fill(&mut self, id: &str, record: SessionRecord) -> SessionRecord {
        let merged = record.clone().merged_with(self.pending.get(id));
        self.records.insert(id.to_string(), record);
        merged
    }

    // == Buffer ==
    /// Records a pending field update. Does not check that the session exists.
    pub fn buffer(&mut self, id: &str, field: impl Into<String>, value: Value) {
        self.pending
            .entry(id.to_string())
            .or_default()
            .insert(field.into(), value);
    }

    /// Drops the pending update for a session, returning it.
    pub fn discard_pending(&mut self, id: &str) -> Option<PendingUpdate> {
        self.pending.remove(id)
    }

    /// Marks a write-back as durable: the merged record becomes the cache entry.
    pub fn commit(&mut self, id: &str, merged: SessionRecord) {
        self.pending.remove(id);
        self.records.insert(id.to_string(), merged);
    }

    // == Purge ==
    /// Forgets everything known about a session.
    pub fn purge(&mut self, id: &str) {
        self.records.remove(id);
        self.pending.remove(id);
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.pending.clear();
    }

    /// Ids with a pending update, sorted.
    pub fn pending_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.pending.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn has_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }
}
