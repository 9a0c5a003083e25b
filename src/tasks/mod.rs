//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expired-session sweep: removes sessions past their max lifetime

mod sweep;

pub use sweep::spawn_sweep_task;
