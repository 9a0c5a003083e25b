//! Backend Connector
//!
//! Holds the lazily established connection of one store instance.

use std::sync::Arc;

use tracing::{debug, error};

use super::{Backend, ClientVariant, Dialer};
use crate::error::{Result, SessionError};

// == Connector ==
/// Lazily dials the backend and selects the configured database.
///
/// A failed dial leaves the connector disconnected so that a later call
/// can try again. There are no retries of its own.
pub struct Connector {
    dialer: Arc<dyn Dialer>,
    address: String,
    variant: ClientVariant,
    database_index: u32,
    conn: Option<Box<dyn Backend>>,
}

impl Connector {
    // == Constructor ==
    pub fn new(
        dialer: Arc<dyn Dialer>,
        address: impl Into<String>,
        variant: ClientVariant,
        database_index: u32,
    ) -> Self {
        Self {
            dialer,
            address: address.into(),
            variant,
            database_index,
            conn: None,
        }
    }

    // == Connect ==
    /// Establishes the connection if there is none yet.
    ///
    /// Failures are logged at error severity and returned; they never panic.
    pub async fn connect(&mut self) -> Result<&mut (dyn Backend + 'static)> {
        if self.conn.is_none() {
            let conn = self.dial().await.map_err(|e| {
                error!(
                    address = %self.address,
                    variant = %self.variant,
                    error = %e,
                    "Could not connect to session backend"
                );
                e
            })?;
            self.conn = Some(conn);
        }

        match self.conn.as_deref_mut() {
            Some(conn) => Ok(conn),
            None => Err(SessionError::Connectivity("not connected".to_string())),
        }
    }

    async fn dial(&self) -> Result<Box<dyn Backend>> {
        let mut conn = self.dialer.dial(&self.address, self.variant).await?;
        conn.select(self.database_index).await.map_err(|e| {
            SessionError::Connectivity(format!(
                "cannot select database {}: {}",
                self.database_index, e
            ))
        })?;
        debug!(database = self.database_index, "Session backend connected");
        Ok(conn)
    }

    // == Disconnect ==
    /// Drops the connection; the next [`connect`](Self::connect) dials again.
    pub fn disconnect(&mut self) {
        self.conn = None;
    }

    /// Returns true if a connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryEngine;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDialer {
        engine: MemoryEngine,
        dials: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Dialer for CountingDialer {
        async fn dial(&self, address: &str, variant: ClientVariant) -> Result<Box<dyn Backend>> {
            self.dials.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SessionError::Connectivity("refused".to_string()));
            }
            self.engine.dial(address, variant).await
        }
    }

    fn dialer(fail: bool) -> Arc<CountingDialer> {
        Arc::new(CountingDialer {
            engine: MemoryEngine::new(),
            dials: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let dialer = dialer(false);
        let mut connector = Connector::new(dialer.clone(), "mem", ClientVariant::Memory, 0);

        connector.connect().await.unwrap();
        connector.connect().await.unwrap();

        assert!(connector.is_connected());
        assert_eq!(dialer.dials.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_selects_database() {
        let dialer = dialer(false);
        let mut connector = Connector::new(dialer.clone(), "mem", ClientVariant::Memory, 5);

        let conn = connector.connect().await.unwrap();
        conn.set("key", b"v".to_vec(), None).await.unwrap();

        assert_eq!(dialer.engine.len(5), 1);
        assert!(dialer.engine.is_empty(0));
    }

    #[tokio::test]
    async fn test_failed_connect_can_be_retried() {
        let dialer = dialer(true);
        let mut connector = Connector::new(dialer.clone(), "mem", ClientVariant::Memory, 0);

        assert!(matches!(
            connector.connect().await,
            Err(SessionError::Connectivity(_))
        ));
        assert!(!connector.is_connected());

        let _ = connector.connect().await;
        assert_eq!(dialer.dials.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_disconnect_forces_redial() {
        let dialer = dialer(false);
        let mut connector = Connector::new(dialer.clone(), "mem", ClientVariant::Memory, 0);

        connector.connect().await.unwrap();
        connector.disconnect();
        connector.connect().await.unwrap();

        assert_eq!(dialer.dials.load(Ordering::SeqCst), 2);
    }
}
