//! HTTP routes for the Slack webhook endpoints.

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use super::state::AppState;
use super::{event_handler, interactive_handler, slash_handler};

/// Build the router for all Slack-facing endpoints.
pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/slack/events", post(event_handler::handle_events))
        .route("/slack/commands", post(slash_handler::handle_slash_command))
        .route(
            "/slack/interactive",
            post(interactive_handler::handle_interactive),
        )
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
