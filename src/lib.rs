//! slackhook - an HTTP receiver for Slack webhooks.
//!
//! The server accepts the three kinds of callbacks Slack pushes to an app,
//! verifies their signatures, parses them into typed payloads, and forwards
//! them to an [`EventHandler`](handler::EventHandler):
//!
//! - `POST /slack/events` - Events API (`url_verification`, `event_callback`)
//! - `POST /slack/commands` - slash commands
//! - `POST /slack/interactive` - block actions, shortcuts, modal submissions
//!
//! Handlers talk back to Slack through [`SlackClient`](slack::SlackClient),
//! a thin retrying wrapper over `slack-morphism`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use slackhook::core::config::AppConfig;
//! use slackhook::core::models::AppMentionEvent;
//! use slackhook::errors::SlackError;
//! use slackhook::handler::{EventHandler, HandlerContext};
//!
//! struct Greeter;
//!
//! #[async_trait]
//! impl EventHandler for Greeter {
//!     async fn on_app_mention(
//!         &self,
//!         ctx: &HandlerContext,
//!         mention: &AppMentionEvent,
//!     ) -> Result<(), SlackError> {
//!         let thread = mention.thread_ts.as_deref().unwrap_or(&mention.ts);
//!         ctx.client
//!             .post_message_in_thread(&mention.channel, thread, "Hello!")
//!             .await?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     slackhook::setup_logging();
//!     let config = AppConfig::from_env()?;
//!     slackhook::server::serve(config, Arc::new(Greeter)).await
//! }
//! ```
// Module declarations
pub mod api;
pub mod core;
pub mod errors;
pub mod handler;
pub mod server;
pub mod slack;

pub use errors::SlackError;
pub use handler::{Dispatcher, EventHandler, HandlerContext, LoggingHandler};

/// Configure structured JSON logging.
///
/// Verbosity comes from `RUST_LOG` and defaults to `info`. Calling this more
/// than once is harmless; only the first call installs the subscriber.
///
/// # Example
///
/// ```
/// slackhook::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
