//! HTTP routes for the generation service

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::handlers;
use crate::AppState;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/jobs", get(handlers::list_jobs))
        .route("/api/generate", post(handlers::generate))
        .route("/api/runs", post(handlers::start_run))
        .route("/api/runs/current", get(handlers::current_run))
        .route("/api/runs/current/cancel", post(handlers::cancel_run))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
