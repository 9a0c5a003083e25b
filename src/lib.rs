//! Session Store - sessions kept in a key-value backend with TTL support
//!
//! Provides a read cache and write-back buffer in front of the backend,
//! session validation, and admin reporting over all stored sessions.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod session;
pub mod tasks;

pub use api::AppState;
pub use config::{Config, SessionConfig};
pub use session::{SessionStore, StoreFactory};
pub use tasks::spawn_sweep_task;
