//! Redis Backend
//!
//! [`Backend`] implementation on top of the `redis` crate.

use async_trait::async_trait;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::{Cmd, FromRedisValue};
use tracing::debug;

use super::{Backend, ClientVariant, Dialer, KeyTtl};
use crate::error::{Result, SessionError};

enum Connection {
    Multiplexed(MultiplexedConnection),
    Managed(ConnectionManager),
}

// == Redis Backend ==
/// A connected Redis client.
pub struct RedisBackend {
    conn: Connection,
}

impl RedisBackend {
    async fn query<T: FromRedisValue>(&mut self, cmd: Cmd) -> Result<T> {
        let reply = match &mut self.conn {
            Connection::Multiplexed(conn) => cmd.query_async(conn).await,
            Connection::Managed(conn) => cmd.query_async(conn).await,
        };
        reply.map_err(SessionError::from)
    }
}

#[async_trait]
impl Backend for RedisBackend {
    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.query(cmd).await
    }

    async fn set(&mut self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> Result<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl);
        }
        self.query(cmd).await
    }

    async fn del(&mut self, key: &str) -> Result<u64> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        self.query(cmd).await
    }

    async fn keys(&mut self, pattern: &str) -> Result<Vec<String>> {
        let mut cmd = redis::cmd("KEYS");
        cmd.arg(pattern);
        self.query(cmd).await
    }

    async fn ttl(&mut self, key: &str) -> Result<KeyTtl> {
        let mut cmd = redis::cmd("TTL");
        cmd.arg(key);
        let reply: i64 = self.query(cmd).await?;
        Ok(KeyTtl::from_reply(reply))
    }

    async fn select(&mut self, index: u32) -> Result<()> {
        let mut cmd = redis::cmd("SELECT");
        cmd.arg(index);
        self.query(cmd).await
    }

    async fn flush_db(&mut self) -> Result<()> {
        self.query(redis::cmd("FLUSHDB")).await
    }
}

// == Redis Dialer ==
/// Dials Redis for the `fast` and `standard` client variants.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisDialer;

#[async_trait]
impl Dialer for RedisDialer {
    async fn dial(&self, address: &str, variant: ClientVariant) -> Result<Box<dyn Backend>> {
        let client = redis::Client::open(address)
            .map_err(|e| SessionError::Connectivity(format!("invalid address {address}: {e}")))?;

        let conn = match variant {
            ClientVariant::Fast => Connection::Multiplexed(
                client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(|e| SessionError::Connectivity(e.to_string()))?,
            ),
            ClientVariant::Standard => Connection::Managed(
                ConnectionManager::new(client)
                    .await
                    .map_err(|e| SessionError::Connectivity(e.to_string()))?,
            ),
            ClientVariant::Memory => {
                return Err(SessionError::Connectivity(
                    "memory client variant cannot be dialed over the network".to_string(),
                ))
            }
        };

        debug!(%address, %variant, "Redis connection established");
        Ok(Box::new(RedisBackend { conn }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dial_rejects_malformed_address() {
        let result = RedisDialer.dial("not a url", ClientVariant::Fast).await;
        assert!(matches!(result, Err(SessionError::Connectivity(_))));
    }

    #[tokio::test]
    async fn test_dial_rejects_memory_variant() {
        let result = RedisDialer
            .dial("redis://127.0.0.1:6379", ClientVariant::Memory)
            .await;
        assert!(matches!(result, Err(SessionError::Connectivity(_))));
    }
}
