//! Binds the listener and runs the webhook server until shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::api::{AppState, build_router};
use crate::core::config::AppConfig;
use crate::handler::EventHandler;

/// Serve the Slack endpoints with `handler` until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address is invalid, the port cannot be bound, or
/// the server fails while running.
pub async fn serve(config: AppConfig, handler: Arc<dyn EventHandler>) -> Result<()> {
    let addr = config.socket_addr()?;

    if config.skip_signature_check {
        warn!("SLACK_SKIP_SIGNATURE_CHECK is set: requests are NOT authenticated");
    }

    let state = AppState::new(config, handler);
    let app = build_router(state.clone());

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!(address = %addr, "Slack webhook server listening");

    tokio::spawn(check_token(state));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

const TOKEN_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Log who the bot token belongs to. A bad token or unreachable Slack is
/// reported but never stops the server.
async fn check_token(state: AppState) {
    let client = state.dispatcher.client();
    match tokio::time::timeout(TOKEN_CHECK_TIMEOUT, client.auth_test()).await {
        Ok(Ok(identity)) => info!(
            bot_user_id = %identity.user_id,
            team_id = %identity.team_id,
            "Slack token verified"
        ),
        Ok(Err(e)) => warn!("Slack auth.test failed, outbound calls may not work: {}", e),
        Err(_) => warn!("Slack auth.test timed out after {:?}", TOKEN_CHECK_TIMEOUT),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Received shutdown signal, draining connections");
}
