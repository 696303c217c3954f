//! Defines the state shared across the Axum application.

use std::sync::Arc;

use super::dedup::EventDeduplicator;
use crate::core::config::AppConfig;
use crate::handler::{Dispatcher, EventHandler};
use crate::slack::SlackClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub dispatcher: Arc<Dispatcher>,
    pub dedup: Arc<EventDeduplicator>,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, handler: Arc<dyn EventHandler>) -> Self {
        let client = Arc::new(SlackClient::new(config.slack_bot_token.clone()));
        let dispatcher =
            Dispatcher::new(handler, client).with_ignore_bot_messages(config.ignore_bot_messages);
        let dedup = EventDeduplicator::new(config.dedup_capacity);

        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            dedup: Arc::new(dedup),
        }
    }
}
