//! Response-related utilities for Slack interactions.
//!
//! This module provides standardized ways to create and format
//! responses sent to Slack, either inline in the HTTP ack or through a
//! `response_url`.

use serde_json::{Value, json};

use crate::core::models::{CommandReply, ReplyVisibility};

/// Create a JSON payload for an ephemeral response
///
/// Ephemeral messages are only visible to the user who triggered the command.
///
/// # Examples
///
/// ```
/// use slackhook::slack::response_builder::create_ephemeral_payload;
///
/// let payload = create_ephemeral_payload("This message is only visible to you");
/// assert_eq!(payload["response_type"], "ephemeral");
/// ```
#[must_use]
pub fn create_ephemeral_payload(text: &str) -> Value {
    json!({
        "text": text,
        "response_type": "ephemeral"
    })
}

/// Create a JSON payload for a message everyone in the channel can see.
#[must_use]
pub fn create_in_channel_payload(text: &str) -> Value {
    json!({
        "text": text,
        "response_type": "in_channel"
    })
}

/// Create a payload that replaces the message the `response_url` belongs to.
///
/// Slack rejects an empty `text`, so `None` or `""` becomes a single space,
/// which effectively blanks the original message.
#[must_use]
pub fn create_replace_original_payload(text: Option<&str>) -> Value {
    let text = text.filter(|t| !t.is_empty()).unwrap_or(" ");
    json!({
        "replace_original": true,
        "text": text
    })
}

#[must_use]
pub fn create_reply_payload(reply: &CommandReply) -> Value {
    match reply.visibility {
        ReplyVisibility::Ephemeral => create_ephemeral_payload(&reply.text),
        ReplyVisibility::InChannel => create_in_channel_payload(&reply.text),
    }
}
