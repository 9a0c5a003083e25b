//! API Module
//!
//! HTTP handlers and routing for the session store admin API.
//!
//! # Endpoints
//! - `POST /sessions` - Create a session
//! - `GET /sessions` - List session ids
//! - `DELETE /sessions` - Remove all sessions
//! - `GET /sessions/:id` - Read a session
//! - `PATCH /sessions/:id` - Update one field, keeping the TTL
//! - `DELETE /sessions/:id` - Remove a session
//! - `GET /sessions/:id/validate` - Validate a session
//! - `GET /reports/active` - Active sessions per user
//! - `GET /reports/expired` - Sessions past their max lifetime
//! - `GET /stats` - Store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
