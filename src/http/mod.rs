//! Operational HTTP surface.
//!
//! # Responsibilities
//! - Expose AI subsystem health for load balancer health checks
//! - Expose per-provider breaker and usage state for operators
//!
//! Generation itself is not served over HTTP; embedders call
//! `AiService::generate` directly.

pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::service::AiService;
use self::handlers::*;

/// Build the ops router. Mount it on the embedding application's server.
pub fn router(service: Arc<AiService>) -> Router {
    Router::new()
        .route("/health/ai", get(get_health))
        .route("/admin/ai/providers", get(get_providers))
        .route("/admin/ai/usage", get(get_usage))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
