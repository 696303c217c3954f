//! Handler for Slack slash commands.
//!
//! Slack expects an answer within three seconds. The handler races the
//! command against the configured ack deadline: a reply that arrives in time
//! is returned inline, a later one goes out through the command's
//! `response_url`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::extract::VerifiedBody;
use super::helpers::{err_response, ok_empty, ok_json, short_ref};
use super::parsing::parse_form_data;
use super::state::AppState;
use crate::core::models::{CommandReply, SlashCommand};
use crate::errors::SlackError;
use crate::slack::SlackClient;
use crate::slack::response_builder::{create_ephemeral_payload, create_reply_payload};

/// What a command handler produced.
pub type CommandResult = Result<Option<CommandReply>, SlackError>;

/// Fate of a reply that missed the ack deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LateReply {
    /// The handler had nothing to say.
    Nothing,
    /// The command carried no `response_url` to post to.
    NoResponseUrl,
    Posted,
    Failed(String),
}

fn failure_text(correlation_id: &str) -> String {
    format!(
        "Sorry, that command failed. Please try again. (ref: {})",
        short_ref(correlation_id)
    )
}

/// `POST /slack/commands`
pub async fn handle_slash_command(
    State(state): State<AppState>,
    verified: VerifiedBody,
) -> Response {
    let command = match verified.text().and_then(parse_form_data) {
        Ok(command) => command,
        Err(e) => {
            error!("Failed to parse slash command: {}", e);
            return e.into_response();
        }
    };

    if command.command.is_empty() {
        return err_response(StatusCode::BAD_REQUEST, "Missing command");
    }

    let correlation_id = Uuid::new_v4().to_string();
    info!(
        correlation_id = %correlation_id,
        command = %command.command,
        user = %command.user_id,
        "Slash command received"
    );

    let (tx, mut rx) = oneshot::channel::<CommandResult>();
    let dispatcher = Arc::clone(&state.dispatcher);
    let task_command = command.clone();
    let task_id = correlation_id.clone();

    tokio::spawn(async move {
        let result = dispatcher.dispatch_command(&task_command, &task_id).await;
        // A closed receiver means the request was already acked.
        if let Err(result) = tx.send(result) {
            let outcome =
                deliver_late_reply(dispatcher.client(), &task_command, &task_id, result).await;
            debug!(correlation_id = %task_id, outcome = ?outcome, "Late reply handled");
        }
    });

    let deadline = Duration::from_millis(state.config.ack_timeout_ms);
    let outcome = match tokio::time::timeout(deadline, &mut rx).await {
        Ok(received) => received,
        Err(_) => {
            rx.close();
            match rx.try_recv() {
                // Finished between the deadline firing and the close.
                Ok(result) => Ok(result),
                Err(_) => {
                    info!(
                        correlation_id = %correlation_id,
                        "Ack deadline passed, reply will follow via response_url"
                    );
                    return ok_empty();
                }
            }
        }
    };

    match outcome {
        Ok(Ok(Some(reply))) => ok_json(create_reply_payload(&reply)),
        Ok(Ok(None)) => ok_empty(),
        Ok(Err(e)) => {
            error!(correlation_id = %correlation_id, "Slash command handler failed: {}", e);
            ok_json(create_ephemeral_payload(&failure_text(&correlation_id)))
        }
        Err(_) => {
            error!(correlation_id = %correlation_id, "Slash command task ended without a result");
            ok_json(create_ephemeral_payload(&failure_text(&correlation_id)))
        }
    }
}

/// Payload for a reply sent after the ack, or `None` when there is nothing to send.
#[must_use]
pub fn late_reply_payload(result: CommandResult, correlation_id: &str) -> Option<Value> {
    match result {
        Ok(Some(reply)) => Some(create_reply_payload(&reply)),
        Ok(None) => None,
        Err(e) => {
            error!(correlation_id = %correlation_id, "Slash command handler failed: {}", e);
            Some(create_ephemeral_payload(&failure_text(correlation_id)))
        }
    }
}

/// Post a command's result to its `response_url` once the request was acked.
pub async fn deliver_late_reply(
    client: &SlackClient,
    command: &SlashCommand,
    correlation_id: &str,
    result: CommandResult,
) -> LateReply {
    let Some(payload) = late_reply_payload(result, correlation_id) else {
        return LateReply::Nothing;
    };

    if command.response_url.is_empty() {
        warn!(correlation_id = %correlation_id, "Late reply dropped: command has no response_url");
        return LateReply::NoResponseUrl;
    }

    match client.respond(&command.response_url, &payload).await {
        Ok(()) => LateReply::Posted,
        Err(e) => {
            error!(correlation_id = %correlation_id, "Failed to deliver late reply: {}", e);
            LateReply::Failed(e.to_string())
        }
    }
}
