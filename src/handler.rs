//! The seam between the webhook endpoints and application code.
//!
//! Implement [`EventHandler`] to react to Slack traffic; every method has a
//! no-op default so implementors only override what they care about.
//! [`Dispatcher`] routes parsed payloads to the matching method.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::api::parsing::v_str;
use crate::core::models::{
    AppMentionEvent, AssistantThread, CommandReply, EventCallback, InteractionPayload,
    MessageEvent, SlackEvent, SlashCommand,
};
use crate::errors::SlackError;
use crate::slack::SlackClient;

/// Per-dispatch context handed to every handler call.
#[derive(Clone)]
pub struct HandlerContext {
    pub client: Arc<SlackClient>,
    /// Correlates log lines of one inbound request.
    pub correlation_id: String,
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_message(
        &self,
        _ctx: &HandlerContext,
        _message: &MessageEvent,
    ) -> Result<(), SlackError> {
        Ok(())
    }

    async fn on_app_mention(
        &self,
        _ctx: &HandlerContext,
        _mention: &AppMentionEvent,
    ) -> Result<(), SlackError> {
        Ok(())
    }

    async fn on_assistant_thread_started(
        &self,
        _ctx: &HandlerContext,
        _thread: &AssistantThread,
    ) -> Result<(), SlackError> {
        Ok(())
    }

    async fn on_member_joined_channel(
        &self,
        _ctx: &HandlerContext,
        _user: &str,
        _channel: &str,
    ) -> Result<(), SlackError> {
        Ok(())
    }

    /// Fallback for inner event types without a dedicated method.
    async fn on_event(
        &self,
        _ctx: &HandlerContext,
        _callback: &EventCallback,
    ) -> Result<(), SlackError> {
        Ok(())
    }

    /// Returning `Some` replies inline if the handler finishes before the ack
    /// deadline, otherwise through the command's `response_url`.
    async fn on_slash_command(
        &self,
        _ctx: &HandlerContext,
        _command: &SlashCommand,
    ) -> Result<Option<CommandReply>, SlackError> {
        Ok(None)
    }

    async fn on_interaction(
        &self,
        _ctx: &HandlerContext,
        _payload: &InteractionPayload,
    ) -> Result<(), SlackError> {
        Ok(())
    }
}

/// Routes parsed payloads to an [`EventHandler`].
pub struct Dispatcher {
    handler: Arc<dyn EventHandler>,
    client: Arc<SlackClient>,
    ignore_bot_messages: bool,
}

impl Dispatcher {
    #[must_use]
    pub fn new(handler: Arc<dyn EventHandler>, client: Arc<SlackClient>) -> Self {
        Self {
            handler,
            client,
            ignore_bot_messages: true,
        }
    }

    /// Whether messages authored by bots (including this one) are dropped.
    #[must_use]
    pub fn with_ignore_bot_messages(mut self, ignore: bool) -> Self {
        self.ignore_bot_messages = ignore;
        self
    }

    #[must_use]
    pub fn client(&self) -> &Arc<SlackClient> {
        &self.client
    }

    #[must_use]
    pub fn context(&self, correlation_id: &str) -> HandlerContext {
        HandlerContext {
            client: Arc::clone(&self.client),
            correlation_id: correlation_id.to_string(),
        }
    }

    /// # Errors
    ///
    /// Propagates the handler's error.
    pub async fn dispatch_event(&self, callback: &EventCallback) -> Result<(), SlackError> {
        let ctx = self.context(&callback.event_id);

        let event = match callback.parse_event() {
            Ok(event) => event,
            Err(e) => {
                warn!(event_id = %callback.event_id, error = %e, "Falling back to raw event");
                SlackEvent::Unknown
            }
        };

        match event {
            SlackEvent::Message(message) => {
                if self.ignore_bot_messages && message.is_from_bot() {
                    debug!(event_id = %callback.event_id, "Ignoring bot-authored message");
                    return Ok(());
                }
                self.handler.on_message(&ctx, &message).await
            }
            SlackEvent::AppMention(mention) => self.handler.on_app_mention(&ctx, &mention).await,
            SlackEvent::AssistantThreadStarted { assistant_thread } => {
                self.handler
                    .on_assistant_thread_started(&ctx, &assistant_thread)
                    .await
            }
            SlackEvent::MemberJoinedChannel { user, channel } => {
                self.handler
                    .on_member_joined_channel(&ctx, &user, &channel)
                    .await
            }
            SlackEvent::Unknown => self.handler.on_event(&ctx, callback).await,
        }
    }

    /// # Errors
    ///
    /// Propagates the handler's error.
    pub async fn dispatch_command(
        &self,
        command: &SlashCommand,
        correlation_id: &str,
    ) -> Result<Option<CommandReply>, SlackError> {
        let ctx = self.context(correlation_id);
        self.handler.on_slash_command(&ctx, command).await
    }

    /// # Errors
    ///
    /// Propagates the handler's error.
    pub async fn dispatch_interaction(
        &self,
        payload: &InteractionPayload,
        correlation_id: &str,
    ) -> Result<(), SlackError> {
        let ctx = self.context(correlation_id);
        self.handler.on_interaction(&ctx, payload).await
    }
}

/// Handler that only records what arrives.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

#[async_trait]
impl EventHandler for LoggingHandler {
    async fn on_message(
        &self,
        ctx: &HandlerContext,
        message: &MessageEvent,
    ) -> Result<(), SlackError> {
        info!(
            correlation_id = %ctx.correlation_id,
            channel = %message.channel,
            user = message.user.as_deref().unwrap_or(""),
            ts = %message.ts,
            "Message received"
        );
        Ok(())
    }

    async fn on_app_mention(
        &self,
        ctx: &HandlerContext,
        mention: &AppMentionEvent,
    ) -> Result<(), SlackError> {
        info!(
            correlation_id = %ctx.correlation_id,
            channel = %mention.channel,
            user = %mention.user,
            "App mention received"
        );
        Ok(())
    }

    async fn on_assistant_thread_started(
        &self,
        ctx: &HandlerContext,
        thread: &AssistantThread,
    ) -> Result<(), SlackError> {
        info!(
            correlation_id = %ctx.correlation_id,
            channel = %thread.channel_id,
            thread_ts = %thread.thread_ts,
            "Assistant thread started"
        );
        Ok(())
    }

    async fn on_member_joined_channel(
        &self,
        ctx: &HandlerContext,
        user: &str,
        channel: &str,
    ) -> Result<(), SlackError> {
        info!(correlation_id = %ctx.correlation_id, user, channel, "Member joined channel");
        Ok(())
    }

    async fn on_event(
        &self,
        ctx: &HandlerContext,
        callback: &EventCallback,
    ) -> Result<(), SlackError> {
        info!(
            correlation_id = %ctx.correlation_id,
            event_type = callback.event_type(),
            team_id = %callback.team_id,
            "Unhandled event type"
        );
        Ok(())
    }

    async fn on_slash_command(
        &self,
        ctx: &HandlerContext,
        command: &SlashCommand,
    ) -> Result<Option<CommandReply>, SlackError> {
        info!(
            correlation_id = %ctx.correlation_id,
            command = %command.command,
            user = %command.user_id,
            channel = %command.channel_id,
            "Slash command received"
        );
        let invocation = format!("{} {}", command.command, command.text);
        Ok(Some(CommandReply::ephemeral(format!(
            "Received `{}`",
            invocation.trim()
        ))))
    }

    async fn on_interaction(
        &self,
        ctx: &HandlerContext,
        payload: &InteractionPayload,
    ) -> Result<(), SlackError> {
        let callback_id = payload
            .callback_id
            .as_deref()
            .or_else(|| payload.extra.get("view").and_then(|v| v_str(v, &["callback_id"])))
            .unwrap_or("");
        let actions: Vec<&str> = payload.action_ids().collect();

        info!(
            correlation_id = %ctx.correlation_id,
            kind = ?payload.kind,
            user = payload.user_id().unwrap_or(""),
            callback_id,
            actions = ?actions,
            "Interaction received"
        );
        Ok(())
    }
}
