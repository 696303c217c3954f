//! Handler for Slack interactive components.
//!
//! Block actions, shortcuts and modal submissions all arrive form-encoded
//! with a single JSON `payload` field.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};
use uuid::Uuid;

use super::extract::VerifiedBody;
use super::helpers::{err_response, ok_empty};
use super::parsing::{is_interactive_body, parse_interactive_payload};
use super::state::AppState;

/// `POST /slack/interactive`
pub async fn handle_interactive(State(state): State<AppState>, verified: VerifiedBody) -> Response {
    let body = match verified.text() {
        Ok(body) => body,
        Err(e) => return e.into_response(),
    };

    if !is_interactive_body(body) {
        return err_response(StatusCode::BAD_REQUEST, "Missing payload field");
    }

    let payload = match parse_interactive_payload(body) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Interactive payload parse error: {}", e);
            return e.into_response();
        }
    };

    let correlation_id = Uuid::new_v4().to_string();
    info!(
        correlation_id = %correlation_id,
        kind = ?payload.kind,
        "Interaction received"
    );

    let dispatcher = Arc::clone(&state.dispatcher);
    tokio::spawn(async move {
        if let Err(e) = dispatcher
            .dispatch_interaction(&payload, &correlation_id)
            .await
        {
            error!(correlation_id = %correlation_id, "Interaction handler failed: {}", e);
        }
    });

    ok_empty()
}
