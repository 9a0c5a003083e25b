//! API Routes
//!
//! Configures the Axum router with all session store endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    active_report_handler, clear_handler, create_handler, delete_handler, expired_report_handler,
    get_handler, health_handler, list_handler, stats_handler, update_handler, validate_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/sessions",
            get(list_handler).post(create_handler).delete(clear_handler),
        )
        .route(
            "/sessions/:id",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .route("/sessions/:id/validate", get(validate_handler))
        .route("/reports/active", get(active_report_handler))
        .route("/reports/expired", get(expired_report_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
