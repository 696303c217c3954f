//! Typed shapes of the payloads Slack pushes to the webhook endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::SlackError;

/// Outer body of an Events API request, discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// One-off handshake Slack sends when the request URL is configured.
    UrlVerification {
        challenge: String,
        #[serde(default)]
        token: Option<String>,
    },
    EventCallback(EventCallback),
    /// Sent when the app exceeds 30,000 events per workspace per hour.
    AppRateLimited {
        #[serde(default)]
        team_id: String,
        #[serde(default)]
        minute_rate_limited: i64,
        #[serde(default)]
        api_app_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCallback {
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub api_app_id: Option<String>,
    pub event_id: String,
    #[serde(default)]
    pub event_time: i64,
    /// Inner event, kept raw so unrecognised types still reach the handler intact.
    pub event: Value,
}

impl EventCallback {
    /// The inner event's `type`, or an empty string when absent.
    #[must_use]
    pub fn event_type(&self) -> &str {
        self.event.get("type").and_then(Value::as_str).unwrap_or("")
    }

    /// Parse the inner event into its typed form.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the event has a known `type` but a malformed body.
    pub fn parse_event(&self) -> Result<SlackEvent, SlackError> {
        serde_json::from_value(self.event.clone()).map_err(|e| {
            SlackError::ParseError(format!("Invalid `{}` event: {e}", self.event_type()))
        })
    }
}

/// Inner event of an `event_callback`, discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEvent {
    Message(MessageEvent),
    AppMention(AppMentionEvent),
    AssistantThreadStarted {
        assistant_thread: AssistantThread,
    },
    MemberJoinedChannel {
        user: String,
        channel: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    /// `im`, `channel`, `group` or `mpim`.
    #[serde(default)]
    pub channel_type: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
}

impl MessageEvent {
    #[must_use]
    pub fn is_from_bot(&self) -> bool {
        self.bot_id.is_some() || self.subtype.as_deref() == Some("bot_message")
    }

    /// A plain message typed by a person: no bot author and no edit/join/system subtype.
    #[must_use]
    pub fn is_user_message(&self) -> bool {
        self.bot_id.is_none() && self.subtype.is_none()
    }

    /// Thread to reply into: the parent thread if any, else the message itself.
    #[must_use]
    pub fn reply_thread_ts(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMentionEvent {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantThread {
    pub channel_id: String,
    pub thread_ts: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Structure representing a Slack slash command event.
/// This contains all the fields that Slack sends when a user invokes a slash command.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlashCommand {
    pub token: String,
    pub team_id: String,
    pub team_domain: String,
    pub channel_id: String,
    pub channel_name: String,
    pub user_id: String,
    pub user_name: String,
    pub command: String,
    pub text: String,
    pub response_url: String,
    pub trigger_id: String,
    pub command_ts: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    BlockActions,
    ViewSubmission,
    ViewClosed,
    Shortcut,
    MessageAction,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Decoded `payload` field of an interactive component request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    #[serde(default)]
    pub user: Option<IdRef>,
    #[serde(default)]
    pub channel: Option<IdRef>,
    #[serde(default)]
    pub trigger_id: Option<String>,
    #[serde(default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub callback_id: Option<String>,
    #[serde(default)]
    pub actions: Vec<Value>,
    /// Everything else Slack sent (`view`, `message`, `container`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InteractionPayload {
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    /// `action_id` of each triggered block action, in order.
    pub fn action_ids(&self) -> impl Iterator<Item = &str> {
        self.actions
            .iter()
            .filter_map(|a| a.get("action_id").and_then(Value::as_str))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyVisibility {
    #[default]
    Ephemeral,
    InChannel,
}

/// Immediate reply to a slash command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    pub text: String,
    pub visibility: ReplyVisibility,
}

impl CommandReply {
    #[must_use]
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            visibility: ReplyVisibility::Ephemeral,
        }
    }

    #[must_use]
    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            visibility: ReplyVisibility::InChannel,
        }
    }
}
