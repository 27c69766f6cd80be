use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/api/health", get(handlers::health_check))
        // One-shot generation
        .route("/api/generate", post(handlers::generate))
        // Sessions
        .route("/api/sessions", post(handlers::create_session))
        .route("/api/sessions/:id", delete(handlers::delete_session))
        .route("/api/sessions/:id/query", post(handlers::query_session))
        .route("/api/sessions/:id/history", get(handlers::session_history))
}

/// Full application with middleware and state attached.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
