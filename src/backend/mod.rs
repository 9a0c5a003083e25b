//! Backend Module
//!
//! The key-value protocol surface the session store consumes, plus the
//! connector that dials it lazily.
//!
//! # Commands
//! - `GET key`, `SET key value [EX ttl]`, `DEL key`
//! - `KEYS pattern`, `TTL key`
//! - `SELECT index`, `FLUSHDB`

mod connector;
mod memory;
mod remote;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::error::Result;

pub use connector::Connector;
pub use memory::{MemoryBackend, MemoryEngine};
pub use remote::{RedisBackend, RedisDialer};

// == Key TTL ==
/// Result of a `TTL key` lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key does not exist (`-2`)
    Missing,
    /// Key exists without an expiry (`-1`)
    Persistent,
    /// Remaining lifetime in seconds
    Expires(u64),
}

impl KeyTtl {
    /// Maps the raw integer reply of the `TTL` command.
    pub fn from_reply(reply: i64) -> Self {
        match reply {
            -1 => KeyTtl::Persistent,
            r if r < 0 => KeyTtl::Missing,
            r => KeyTtl::Expires(r as u64),
        }
    }
}

// == Client Variant ==
/// Which client implementation the connector dials with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientVariant {
    /// One multiplexed connection shared by all commands
    Fast,
    /// Connection manager that re-dials dropped connections itself
    Standard,
    /// In-process key space, nothing is dialed
    Memory,
}

impl FromStr for ClientVariant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" | "1" => Ok(ClientVariant::Fast),
            "standard" | "0" => Ok(ClientVariant::Standard),
            "memory" => Ok(ClientVariant::Memory),
            other => Err(format!("unknown client variant: {other}")),
        }
    }
}

impl fmt::Display for ClientVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientVariant::Fast => "fast",
            ClientVariant::Standard => "standard",
            ClientVariant::Memory => "memory",
        };
        f.write_str(name)
    }
}

// == Backend ==
/// An established connection to the key-value store.
///
/// Each command is atomic on its own; sequences of commands are not.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET key`
    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>>;

    /// `SET key value`, or `SET key value EX ttl` when `ttl` is given
    async fn set(&mut self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> Result<()>;

    /// `DEL key`, returns how many keys were removed
    async fn del(&mut self, key: &str) -> Result<u64>;

    /// `KEYS pattern`
    async fn keys(&mut self, pattern: &str) -> Result<Vec<String>>;

    /// `TTL key`
    async fn ttl(&mut self, key: &str) -> Result<KeyTtl>;

    /// `SELECT index`
    async fn select(&mut self, index: u32) -> Result<()>;

    /// `FLUSHDB`
    async fn flush_db(&mut self) -> Result<()>;
}

// == Dialer ==
/// Builds a [`Backend`] connection for an address and client variant.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, address: &str, variant: ClientVariant) -> Result<Box<dyn Backend>>;
}
