//! HTTP routes.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::app::App;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/status", get(status))
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize)]
struct Status {
    connections: usize,
    intent_matcher: String,
}

async fn status(State(app): State<Arc<App>>) -> Json<Status> {
    Json(Status {
        connections: app.connections.connection_count(),
        intent_matcher: app.intent_matcher.to_string(),
    })
}
