//! In-Memory Backend
//!
//! A TTL-aware key space with numbered databases, speaking the same command
//! surface as the Redis backend. Used by the `memory` client variant and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use super::{Backend, ClientVariant, Dialer, KeyTtl};
use crate::error::Result;

// == Entry ==
#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    expires_at: Option<u64>,
}

impl Entry {
    fn new(value: Vec<u8>, ttl_seconds: Option<u64>) -> Self {
        let expires_at =
            ttl_seconds.map(|ttl| current_timestamp_ms().saturating_add(ttl.saturating_mul(1000)));
        Self { value, expires_at }
    }

    /// Expired once the current time reaches the expiration time.
    fn is_expired(&self, now: u64) -> bool {
        matches!(self.expires_at, Some(expires) if now >= expires)
    }

    /// Remaining TTL in whole seconds, rounded up the way Redis reports it.
    fn ttl_remaining(&self, now: u64) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(now).div_ceil(1000))
    }
}

type Database = HashMap<String, Entry>;

// == Memory Engine ==
/// Shared key space. Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    databases: Arc<Mutex<HashMap<u32, Database>>>,
}

impl MemoryEngine {
    /// Creates an empty key space.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, Database>> {
        self.databases.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a connection handle, initially on database 0.
    pub fn connect(&self) -> MemoryBackend {
        MemoryBackend {
            engine: self.clone(),
            index: 0,
        }
    }

    /// Reads a live value without going through a connection.
    pub fn peek(&self, index: u32, key: &str) -> Option<Vec<u8>> {
        let now = current_timestamp_ms();
        self.lock()
            .get(&index)
            .and_then(|db| db.get(key))
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    /// Writes a value without going through a connection.
    pub fn put(&self, index: u32, key: &str, value: Vec<u8>, ttl: Option<u64>) {
        self.lock()
            .entry(index)
            .or_default()
            .insert(key.to_string(), Entry::new(value, ttl));
    }

    /// Number of live keys in a database.
    pub fn len(&self, index: u32) -> usize {
        let now = current_timestamp_ms();
        self.lock()
            .get(&index)
            .map(|db| db.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    /// Returns true if the database holds no live keys.
    pub fn is_empty(&self, index: u32) -> bool {
        self.len(index) == 0
    }

    fn with_db<T>(&self, index: u32, f: impl FnOnce(&mut Database, u64) -> T) -> T {
        let now = current_timestamp_ms();
        let mut guard = self.lock();
        let db = guard.entry(index).or_default();
        db.retain(|_, entry| !entry.is_expired(now));
        f(db, now)
    }
}

#[async_trait]
impl Dialer for MemoryEngine {
    async fn dial(&self, _address: &str, _variant: ClientVariant) -> Result<Box<dyn Backend>> {
        Ok(Box::new(self.connect()))
    }
}

// == Memory Backend ==
/// A connection to a [`MemoryEngine`] with its own selected database.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    engine: MemoryEngine,
    index: u32,
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .engine
            .with_db(self.index, |db, _| db.get(key).map(|e| e.value.clone())))
    }

    async fn set(&mut self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> Result<()> {
        self.engine.with_db(self.index, |db, _| {
            db.insert(key.to_string(), Entry::new(value, ttl));
        });
        Ok(())
    }

    async fn del(&mut self, key: &str) -> Result<u64> {
        Ok(self
            .engine
            .with_db(self.index, |db, _| u64::from(db.remove(key).is_some())))
    }

    async fn keys(&mut self, pattern: &str) -> Result<Vec<String>> {
        Ok(self.engine.with_db(self.index, |db, _| {
            db.keys()
                .filter(|key| glob_match(pattern.as_bytes(), key.as_bytes()))
                .cloned()
                .collect()
        }))
    }

    async fn ttl(&mut self, key: &str) -> Result<KeyTtl> {
        Ok(self.engine.with_db(self.index, |db, now| match db.get(key) {
            None => KeyTtl::Missing,
            Some(entry) => match entry.ttl_remaining(now) {
                Some(secs) => KeyTtl::Expires(secs),
                None => KeyTtl::Persistent,
            },
        }))
    }

    async fn select(&mut self, index: u32) -> Result<()> {
        self.index = index;
        Ok(())
    }

    async fn flush_db(&mut self) -> Result<()> {
        self.engine.with_db(self.index, |db, _| db.clear());
        Ok(())
    }
}

/// Glob matching with `*` and `?`, as used by `KEYS`.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == b'?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}

/// Returns current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
