//! All Slack-specific functionality

pub mod client;
pub mod response_builder;

// Re-export main types for convenience
pub use client::{BotIdentity, SlackClient, validate_response_url};
