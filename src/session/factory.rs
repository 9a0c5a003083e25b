//! Store Factory
//!
//! Opens one [`SessionStore`] per unit of work (a request, a sweep run) so
//! that read caches never outlive it, and closes it again.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::stats::StoreStats;
use super::store::{default_dialer, FlushReport, SessionStore};
use crate::backend::Dialer;
use crate::config::SessionConfig;
use crate::providers::{Clock, IdGenerator, SystemClock, UuidGenerator};

#[derive(Clone)]
pub struct StoreFactory {
    config: SessionConfig,
    dialer: Arc<dyn Dialer>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    /// Counters of every store closed through this factory
    totals: Arc<Mutex<StoreStats>>,
}

impl StoreFactory {
    pub fn new(config: SessionConfig, dialer: Arc<dyn Dialer>) -> Self {
        Self {
            config,
            dialer,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            totals: Arc::new(Mutex::new(StoreStats::new())),
        }
    }

    /// Factory with the dialer matching the configured client variant.
    pub fn from_config(config: SessionConfig) -> Self {
        let dialer = default_dialer(config.client_variant);
        Self::new(config, dialer)
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

    // == Open ==
    pub fn open(&self) -> SessionStore {
        SessionStore::new(self.config.clone(), self.dialer.clone())
            .with_clock(self.clock.clone())
            .with_id_generator(self.ids.clone())
    }

    // == Finish ==
    /// Closes a store opened here and folds its counters into the totals.
    pub async fn finish(&self, mut store: SessionStore) -> FlushReport {
        let report = store.close().await;
        if report.flushed + report.skipped > 0 {
            debug!(flushed = report.flushed, skipped = report.skipped, "Store closed");
        }
        self.totals.lock().await.absorb(&store.stats());
        report
    }

    pub async fn totals(&self) -> StoreStats {
        self.totals.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryEngine;
    use crate::session::RequestOrigin;
    use serde_json::json;

    #[tokio::test]
    async fn test_stores_share_the_backend() {
        let factory = StoreFactory::new(SessionConfig::default(), Arc::new(MemoryEngine::new()));

        let mut first = factory.open();
        let id = first
            .create([("UserID", json!(1))], &RequestOrigin::default())
            .await
            .unwrap();
        factory.finish(first).await;

        let mut second = factory.open();
        assert!(second.get(&id).await.is_some());
        factory.finish(second).await;

        let totals = factory.totals().await;
        assert_eq!(totals.backend_reads, 1);
    }

    #[tokio::test]
    async fn test_finish_writes_back_buffered_updates() {
        let factory = StoreFactory::new(SessionConfig::default(), Arc::new(MemoryEngine::new()));

        let mut store = factory.open();
        let id = store
            .create([("UserID", json!(1))], &RequestOrigin::default())
            .await
            .unwrap();
        store.buffer_update(&id, "Foo", "Bar");
        factory.finish(store).await;

        let mut reader = factory.open();
        let record = reader.get(&id).await.unwrap();
        assert_eq!(record.get_str("Foo").as_deref(), Some("Bar"));
        assert_eq!(factory.totals().await.flushed, 1);
    }
}
