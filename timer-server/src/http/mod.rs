//! HTTP endpoints for cubetime-server.
//!
//! Provides the sync endpoint and a health check.

pub mod health;
mod sync;

use crate::server::SyncServer;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;

pub use health::HealthStatus;

/// Build the HTTP router with all endpoints.
pub fn build_router(server: Arc<SyncServer>) -> Router {
    Router::new()
        .route("/api/sync", get(sync::pull_handler).post(sync::push_handler))
        .route("/health", get(health::health_handler))
        .layer(Extension(server))
}
