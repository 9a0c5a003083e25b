//! Session Store Module
//!
//! Session lifecycle on top of the backend: create, read through the
//! two-tier cache, buffer field updates, write them back on close, remove.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::cache::SessionCache;
use super::codec::{JsonCodec, RecordCodec};
use super::record::{
    SessionRecord, CHALLENGE_TOKEN, REMOTE_ADDR, REMOTE_USER_AGENT, SESSION_START,
};
use super::stats::StoreStats;
use super::validator::InvalidReason;
use crate::backend::{ClientVariant, Connector, Dialer, KeyTtl, MemoryEngine, RedisDialer};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::providers::{Clock, IdGenerator, SystemClock, UuidGenerator};

/// Prefix of every session key in the backend.
pub const KEY_PREFIX: &str = "OTRSSession-";

/// Backend key of a session.
pub fn session_key(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Where a request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    pub remote_addr: String,
    pub user_agent: String,
}

impl RequestOrigin {
    pub fn new(remote_addr: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            remote_addr: remote_addr.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// What happened to one buffered session at flush time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    Written,
    Skipped,
}

/// Totals of a [`SessionStore::close`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub flushed: usize,
    pub skipped: usize,
}

// == Session Store ==
/// Session store over a key-value backend with TTL support.
///
/// Owners must call [`close`](Self::close) once before dropping the store,
/// otherwise buffered updates are lost.
pub struct SessionStore {
    pub(super) config: SessionConfig,
    pub(super) connector: Connector,
    pub(super) codec: Arc<dyn RecordCodec>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) ids: Arc<dyn IdGenerator>,
    pub(super) cache: SessionCache,
    pub(super) stats: StoreStats,
    pub(super) last_invalid: Option<InvalidReason>,
    closed: bool,
}

impl SessionStore {
    // == Constructor ==
    /// Creates a store dialing through `dialer`. Nothing is dialed until first use.
    pub fn new(config: SessionConfig, dialer: Arc<dyn Dialer>) -> Self {
        let connector = Connector::new(
            dialer,
            config.backend_address.clone(),
            config.client_variant,
            config.database_index,
        );
        Self {
            config,
            connector,
            codec: Arc::new(JsonCodec),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            cache: SessionCache::new(),
            stats: StoreStats::new(),
            last_invalid: None,
            closed: false,
        }
    }

    /// Creates a store with the dialer matching the configured client variant.
    pub fn from_config(config: SessionConfig) -> Self {
        let dialer = default_dialer(config.client_variant);
        Self::new(config, dialer)
    }

    pub fn with_codec(mut self, codec: Arc<dyn RecordCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn stats(&self) -> StoreStats {
        self.stats.clone()
    }

    // == Create ==
    /// Creates a session from caller fields plus the canonical ones.
    ///
    /// The key gets the idle timeout as TTL, or no expiry when none is configured.
    pub async fn create<K, I>(&mut self, fields: I, origin: &RequestOrigin) -> Result<String>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let id = self.ids.generate();

        let mut record: SessionRecord = fields.into_iter().collect();
        record.insert(SESSION_START, self.clock.now());
        record.insert(REMOTE_ADDR, origin.remote_addr.clone());
        record.insert(REMOTE_USER_AGENT, origin.user_agent.clone());
        record.insert(CHALLENGE_TOKEN, self.ids.generate());

        let blob = self.codec.encode(&record)?;
        let ttl = (self.config.idle_timeout > 0).then_some(self.config.idle_timeout);
        let key = session_key(&id);

        let written = {
            let conn = self.connector.connect().await?;
            conn.set(&key, blob, ttl).await
        };
        if let Err(e) = written {
            self.command_failed("SET", &id, &e);
            return Err(e);
        }

        self.cache.fill(&id, record);
        info!(session_id = %id, ttl = ?ttl, "Session created");
        Ok(id)
    }

    // == Get ==
    /// Returns the session record with pending updates applied.
    ///
    /// `None` covers a missing key, an undecodable blob, an empty record and
    /// an unreachable backend alike.
    pub async fn get(&mut self, id: &str) -> Option<SessionRecord> {
        if id.is_empty() {
            error!("Got no session id");
            return None;
        }

        if let Some(record) = self.cache.lookup(id) {
            self.stats.record_cache_hit();
            return Some(record);
        }

        let key = session_key(id);
        let fetched = {
            let conn = self.connector.connect().await.ok()?;
            conn.get(&key).await
        };
        self.stats.record_backend_read();

        let blob = match fetched {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                self.cache.discard_pending(id);
                return None;
            }
            Err(e) => {
                self.command_failed("GET", id, &e);
                return None;
            }
        };

        match self.codec.decode(&blob) {
            Ok(record) if !record.is_empty() => Some(self.cache.fill(id, record)),
            Ok(_) => {
                debug!(session_id = %id, "Stored session record is empty");
                self.cache.discard_pending(id);
                None
            }
            Err(e) => {
                warn!(session_id = %id, error = ?e, "Could not decode session record");
                self.stats.record_decode_failure();
                self.cache.discard_pending(id);
                None
            }
        }
    }

    // == Buffer Update ==
    /// Buffers a field update, written back on [`close`](Self::close).
    ///
    /// The session is not checked for existence. An update for a session that
    /// is gone by flush time is dropped without any signal.
    pub fn buffer_update(&mut self, id: &str, field: &str, value: impl Into<Value>) {
        if id.is_empty() || field.is_empty() {
            error!(session_id = %id, field = %field, "Got no session id or field name");
            return;
        }
        if self.closed {
            warn!(session_id = %id, field = %field, "Store is closed, dropping update");
            return;
        }
        self.cache.buffer(id, field, value.into());
    }

    // == Flush ==
    /// Writes the pending update of one session back, keeping the key's TTL.
    ///
    /// Reading the TTL and rewriting the key are two commands; a concurrent
    /// writer or an expiry in between is not detected.
    pub async fn flush(&mut self, id: &str) -> FlushOutcome {
        if !self.cache.has_pending(id) {
            return FlushOutcome::Skipped;
        }

        let Some(merged) = self.get(id).await else {
            return self.skip_flush(id, "session no longer exists");
        };

        let key = session_key(id);
        let ttl = {
            match self.connector.connect().await.ok() {
                Some(conn) => conn.ttl(&key).await,
                None => return self.skip_flush(id, "backend unavailable"),
            }
        };

        let ttl = match ttl {
            Ok(KeyTtl::Expires(secs)) if secs > 0 => secs,
            Ok(_) => return self.skip_flush(id, "key has no expiry or is gone"),
            Err(e) => {
                self.command_failed("TTL", id, &e);
                return self.skip_flush(id, "ttl lookup failed");
            }
        };

        let blob = match self.codec.encode(&merged) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(session_id = %id, error = %e, "Could not encode session record");
                return self.skip_flush(id, "encode failed");
            }
        };

        let written = {
            match self.connector.connect().await.ok() {
                Some(conn) => conn.set(&key, blob, Some(ttl)).await,
                None => return self.skip_flush(id, "backend unavailable"),
            }
        };
        if let Err(e) = written {
            self.command_failed("SET", id, &e);
            return self.skip_flush(id, "write failed");
        }

        self.cache.commit(id, merged);
        self.stats.record_flushed();
        debug!(session_id = %id, ttl, "Session update written back");
        FlushOutcome::Written
    }

    fn skip_flush(&mut self, id: &str, why: &str) -> FlushOutcome {
        self.cache.discard_pending(id);
        self.stats.record_flush_skipped();
        debug!(session_id = %id, reason = why, "Skipped session write-back");
        FlushOutcome::Skipped
    }

    // == Close ==
    /// Flushes every buffered session once. Further calls do nothing.
    pub async fn close(&mut self) -> FlushReport {
        if self.closed {
            return FlushReport::default();
        }
        self.closed = true;

        let mut report = FlushReport::default();
        for id in self.cache.pending_ids() {
            match self.flush(&id).await {
                FlushOutcome::Written => report.flushed += 1,
                FlushOutcome::Skipped => report.skipped += 1,
            }
        }
        report
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // == Remove ==
    /// Deletes a session. Removing a session that does not exist is not an error.
    pub async fn remove(&mut self, id: &str) -> Result<()> {
        if id.is_empty() {
            error!("Got no session id");
            return Err(SessionError::MissingArgument("session_id"));
        }

        let key = session_key(id);
        let deleted = {
            let conn = self.connector.connect().await?;
            conn.del(&key).await
        };
        if let Err(e) = deleted {
            self.command_failed("DEL", id, &e);
            return Err(e);
        }

        self.cache.purge(id);
        info!(session_id = %id, "Removed session");
        Ok(())
    }

    /// Logs a failed command and drops the connection so the next call redials.
    pub(super) fn command_failed(&mut self, command: &str, id: &str, err: &SessionError) {
        error!(command, session_id = %id, error = %err, "Session backend command failed");
        self.connector.disconnect();
    }
}

/// Dialer for a client variant: in-process for `memory`, Redis otherwise.
pub fn default_dialer(variant: ClientVariant) -> Arc<dyn Dialer> {
    match variant {
        ClientVariant::Memory => Arc::new(MemoryEngine::new()),
        ClientVariant::Fast | ClientVariant::Standard => Arc::new(RedisDialer),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use serde_json::json;

    fn memory_store() -> (SessionStore, MemoryEngine) {
        let engine = MemoryEngine::new();
        let config = SessionConfig {
            client_variant: ClientVariant::Memory,
            ..SessionConfig::default()
        };
        (SessionStore::new(config, Arc::new(engine.clone())), engine)
    }

    fn origin() -> RequestOrigin {
        RequestOrigin::new("10.0.0.1", "test-agent")
    }

    #[test]
    fn test_session_key() {
        assert_eq!(session_key("abc"), "OTRSSession-abc");
    }

    #[tokio::test]
    async fn test_create_sets_canonical_fields() {
        let (mut store, _) = memory_store();

        let id = store
            .create([("UserID", json!(1)), ("UserLogin", json!("root"))], &origin())
            .await
            .unwrap();
        let record = store.get(&id).await.unwrap();

        assert_eq!(record.get_str(REMOTE_ADDR).as_deref(), Some("10.0.0.1"));
        assert_eq!(record.get_str(REMOTE_USER_AGENT).as_deref(), Some("test-agent"));
        assert!(record.has_value(SESSION_START));
        assert!(record.has_value(CHALLENGE_TOKEN));
    }

    #[tokio::test]
    async fn test_canonical_fields_override_caller() {
        let (mut store, _) = memory_store();

        let id = store
            .create(
                [("UserID", json!(1)), ("UserRemoteAddr", json!("spoofed"))],
                &origin(),
            )
            .await
            .unwrap();

        let record = store.get(&id).await.unwrap();
        assert_eq!(record.get_str(REMOTE_ADDR).as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_create_without_idle_timeout_has_no_expiry() {
        let engine = MemoryEngine::new();
        let config = SessionConfig {
            idle_timeout: 0,
            ..SessionConfig::default()
        };
        let mut store = SessionStore::new(config, Arc::new(engine.clone()));

        let id = store.create([("UserID", json!(1))], &origin()).await.unwrap();

        let mut conn = engine.connect();
        assert_eq!(
            conn.ttl(&session_key(&id)).await.unwrap(),
            KeyTtl::Persistent
        );
    }

    #[tokio::test]
    async fn test_get_empty_id() {
        let (mut store, _) = memory_store();
        assert!(store.get("").await.is_none());
    }

    #[tokio::test]
    async fn test_second_get_is_cache_hit() {
        let (mut store, engine) = memory_store();
        let id = store.create([("UserID", json!(1))], &origin()).await.unwrap();

        // a fresh store has to go to the backend once
        let mut other = SessionStore::new(store.config().clone(), Arc::new(engine));
        other.get(&id).await.unwrap();
        other.get(&id).await.unwrap();

        let stats = other.stats();
        assert_eq!(stats.backend_reads, 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[tokio::test]
    async fn test_flush_without_pending_is_skipped() {
        let (mut store, _) = memory_store();
        assert_eq!(store.flush("nothing").await, FlushOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_close_runs_once() {
        let (mut store, _) = memory_store();
        let id = store.create([("UserID", json!(1))], &origin()).await.unwrap();
        store.buffer_update(&id, "Foo", "Bar");

        assert_eq!(store.close().await, FlushReport { flushed: 1, skipped: 0 });
        assert!(store.is_closed());
        assert_eq!(store.close().await, FlushReport::default());
    }

    #[tokio::test]
    async fn test_remove_empty_id() {
        let (mut store, _) = memory_store();
        assert_eq!(
            store.remove("").await,
            Err(SessionError::MissingArgument("session_id"))
        );
    }
}
