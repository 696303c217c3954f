//! Handler for Slack Events API callbacks.
//!
//! This module processes:
//! - `url_verification` - the handshake Slack runs when the request URL is saved
//! - `event_callback` - workspace events, forwarded to the
//!   [`EventHandler`](crate::handler::EventHandler)
//! - `app_rate_limited` - notice that Slack is dropping events for this app

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::extract::VerifiedBody;
use super::helpers::{challenge, err_response, ok_empty};
use super::parsing::retry_info;
use super::state::AppState;
use crate::core::models::{EventCallback, EventEnvelope};

/// `POST /slack/events`
pub async fn handle_events(State(state): State<AppState>, verified: VerifiedBody) -> Response {
    let envelope: EventEnvelope = match serde_json::from_slice(&verified.body) {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("Invalid Events API body: {}", e);
            return err_response(StatusCode::BAD_REQUEST, &format!("Parse Error: {e}"));
        }
    };

    match envelope {
        EventEnvelope::UrlVerification { challenge: value, .. } => {
            info!("Answering url_verification challenge");
            challenge(&value)
        }
        EventEnvelope::EventCallback(callback) => {
            handle_event_callback(&state, &verified.headers, callback)
        }
        EventEnvelope::AppRateLimited {
            team_id,
            minute_rate_limited,
            ..
        } => {
            warn!(
                team_id = %team_id,
                minute_rate_limited,
                "Slack is rate limiting event delivery for this app"
            );
            ok_empty()
        }
        EventEnvelope::Unknown => {
            debug!("Ignoring unknown Events API envelope");
            ok_empty()
        }
    }
}

/// Ack immediately and run the handler on its own task.
fn handle_event_callback(
    state: &AppState,
    headers: &HeaderMap,
    callback: EventCallback,
) -> Response {
    if let Some(retry) = retry_info(headers) {
        info!(
            event_id = %callback.event_id,
            retry_num = retry.num,
            retry_reason = retry.reason.as_deref().unwrap_or(""),
            "Slack redelivery"
        );
    }

    if !state.dedup.first_seen(&callback.event_id) {
        info!(event_id = %callback.event_id, "Duplicate event delivery, skipping");
        return ok_empty();
    }

    info!(
        event_id = %callback.event_id,
        event_type = callback.event_type(),
        "Processing event callback"
    );

    let dispatcher = Arc::clone(&state.dispatcher);
    let span = info_span!("event", event_id = %callback.event_id);
    tokio::spawn(
        async move {
            if let Err(e) = dispatcher.dispatch_event(&callback).await {
                error!(event_type = callback.event_type(), "Event handler failed: {}", e);
            }
        }
        .instrument(span),
    );

    ok_empty()
}
