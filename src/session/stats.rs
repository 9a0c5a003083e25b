//! Store Statistics Module
//!
//! Counts how often reads are served locally versus from the backend, and
//! what happened to write-backs.

use serde::Serialize;

// == Store Stats ==
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Reads answered from the read cache
    pub cache_hits: u64,
    /// Reads that went to the backend
    pub backend_reads: u64,
    /// Backend blobs that failed to decode
    pub decode_failures: u64,
    /// Pending updates written back
    pub flushed: u64,
    /// Pending updates dropped at flush time
    pub flush_skipped: u64,
}

impl StoreStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns cache_hits / (cache_hits + backend_reads), or 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.backend_reads;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_backend_read(&mut self) {
        self.backend_reads += 1;
    }

    pub fn record_decode_failure(&mut self) {
        self.decode_failures += 1;
    }

    pub fn record_flushed(&mut self) {
        self.flushed += 1;
    }

    pub fn record_flush_skipped(&mut self) {
        self.flush_skipped += 1;
    }

    // == Absorb ==
    /// Adds the counters of another store instance to these.
    pub fn absorb(&mut self, other: &StoreStats) {
        self.cache_hits += other.cache_hits;
        self.backend_reads += other.backend_reads;
        self.decode_failures += other.decode_failures;
        self.flushed += other.flushed;
        self.flush_skipped += other.flush_skipped;
    }
}
