//! Request and Response models for the session store API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ActiveSessionsQuery, CreateSessionRequest, UpdateSessionRequest, ValidateQuery};
pub use responses::{
    CreateSessionResponse, DeleteResponse, HealthResponse, SessionListResponse, SessionResponse,
    StatsResponse, UpdateResponse, ValidateResponse,
};
