use std::sync::Arc;

use anyhow::{Context, Result};
use slackhook::core::config::AppConfig;
use slackhook::handler::LoggingHandler;

#[tokio::main]
async fn main() -> Result<()> {
    slackhook::setup_logging();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    slackhook::server::serve(config, Arc::new(LoggingHandler)).await
}
