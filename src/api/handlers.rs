//! API Handlers
//!
//! HTTP request handlers for each session store endpoint. Every request
//! works on its own store instance, closed before the response is sent.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    Json,
};

use crate::error::{Result, SessionError};
use crate::models::{
    ActiveSessionsQuery, CreateSessionRequest, CreateSessionResponse, DeleteResponse,
    HealthResponse, SessionListResponse, SessionResponse, StatsResponse, UpdateSessionRequest,
    UpdateResponse, ValidateQuery, ValidateResponse,
};
use crate::session::{ActiveSessionStats, ExpiredSessions, RequestOrigin, StoreFactory};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub factory: StoreFactory,
}

impl AppState {
    pub fn new(factory: StoreFactory) -> Self {
        Self { factory }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(StoreFactory::from_config(config.session.clone()))
    }
}

/// Remote address and user agent from proxy and client headers.
fn request_origin(headers: &HeaderMap) -> RequestOrigin {
    let remote_addr = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .unwrap_or_default();
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    RequestOrigin::new(remote_addr, user_agent)
}

/// Handler for POST /sessions
pub async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>> {
    let mut store = state.factory.open();
    let created = store.create(req.fields, &request_origin(&headers)).await;
    state.factory.finish(store).await;

    Ok(Json(CreateSessionResponse {
        session_id: created?,
    }))
}

/// Handler for GET /sessions
pub async fn list_handler(State(state): State<AppState>) -> Result<Json<SessionListResponse>> {
    let mut store = state.factory.open();
    let listed = store.list_ids().await;
    state.factory.finish(store).await;

    let mut session_ids = listed?;
    session_ids.sort();
    Ok(Json(SessionListResponse { session_ids }))
}

/// Handler for GET /sessions/:id
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>> {
    let mut store = state.factory.open();
    let record = store.get(&id).await;
    state.factory.finish(store).await;

    match record {
        Some(fields) => Ok(Json(SessionResponse {
            session_id: id,
            fields,
        })),
        None => Err(SessionError::NotFound(id)),
    }
}

/// Handler for PATCH /sessions/:id
///
/// The update is buffered and written back when the request's store closes,
/// keeping the session's remaining TTL.
pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<Json<UpdateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(SessionError::InvalidRequest(error_msg));
    }

    let mut store = state.factory.open();
    store.buffer_update(&id, &req.field, req.value);
    let report = state.factory.finish(store).await;

    Ok(Json(UpdateResponse {
        session_id: id,
        written: report.flushed > 0,
    }))
}

/// Handler for DELETE /sessions/:id
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut store = state.factory.open();
    let removed = store.remove(&id).await;
    state.factory.finish(store).await;

    removed?;
    Ok(Json(DeleteResponse::session(&id)))
}

/// Handler for DELETE /sessions
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<DeleteResponse>> {
    let mut store = state.factory.open();
    let cleared = store.clear_all().await;
    state.factory.finish(store).await;

    cleared?;
    Ok(Json(DeleteResponse::all()))
}

/// Handler for GET /sessions/:id/validate
pub async fn validate_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ValidateQuery>,
    headers: HeaderMap,
) -> Json<ValidateResponse> {
    let remote_addr = query
        .remote_addr
        .unwrap_or_else(|| request_origin(&headers).remote_addr);

    let mut store = state.factory.open();
    let outcome = store.validate(&id, &remote_addr).await;
    state.factory.finish(store).await;

    Json(ValidateResponse::from(outcome))
}

/// Handler for GET /reports/active
pub async fn active_report_handler(
    State(state): State<AppState>,
    Query(query): Query<ActiveSessionsQuery>,
) -> Result<Json<ActiveSessionStats>> {
    let mut store = state.factory.open();
    let stats = store.active_session_stats(&query.user_type).await;
    state.factory.finish(store).await;

    Ok(Json(stats?))
}

/// Handler for GET /reports/expired
pub async fn expired_report_handler(
    State(state): State<AppState>,
) -> Result<Json<ExpiredSessions>> {
    let mut store = state.factory.open();
    let expired = store.expired_ids().await;
    state.factory.finish(store).await;

    Ok(Json(expired?))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.factory.totals().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
