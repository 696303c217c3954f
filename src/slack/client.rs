//! Slack API client module
//!
//! Wraps the `slack-morphism` client with retry logic and error handling.

use reqwest::Client;
use serde_json::Value;
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::{SlackApiChatPostMessageRequest, SlackApiConversationsOpenRequest};
use slack_morphism::{
    SlackApiToken, SlackApiTokenValue, SlackChannelId, SlackMessageContent, SlackTs, SlackUserId,
};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};
use url::Url;

use crate::errors::SlackError;

// Build the Slack client connector safely without panicking.
// If connector construction fails, store None and surface a SlackError at call sites.
static SLACK_CLIENT: std::sync::LazyLock<Option<SlackHyperClient>> =
    std::sync::LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Retries after the first attempt; five attempts in total.
const MAX_RETRIES: usize = 4;
const MAX_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Delays between attempts: 100ms, 200ms, 400ms, 800ms, each jittered.
pub(crate) fn retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(50)
        .max_delay(MAX_RETRY_DELAY)
        .map(jitter)
        .take(MAX_RETRIES)
}

/// Run `operation`, repeating it only while it fails with a retryable error.
pub(crate) async fn retry_transient<F, Fut, T>(operation: F) -> Result<T, SlackError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SlackError>>,
{
    RetryIf::start(retry_strategy(), operation, SlackError::is_retryable).await
}

fn connector() -> Result<&'static SlackHyperClient, SlackError> {
    SLACK_CLIENT
        .as_ref()
        .ok_or_else(|| SlackError::GeneralError("Slack HTTP connector not initialized".to_string()))
}

/// Identity of the token's owner, as reported by `auth.test`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: String,
    pub team_id: String,
}

/// Check that a `response_url` points at Slack before anything is posted to it.
///
/// # Errors
///
/// Returns `ApiError` if the URL does not parse, is not `https`, or is not a `slack.com` host.
pub fn validate_response_url(response_url: &str) -> Result<Url, SlackError> {
    let url = Url::parse(response_url)
        .map_err(|e| SlackError::ApiError(format!("Invalid response_url: {e}")))?;

    let host_ok = url
        .host_str()
        .is_some_and(|h| h == "slack.com" || h.ends_with(".slack.com"));

    if url.scheme() != "https" || !host_ok {
        return Err(SlackError::ApiError(format!(
            "Refusing to post to non-Slack response_url: {response_url}"
        )));
    }

    Ok(url)
}

/// Slack API client with retry logic and error handling
pub struct SlackClient {
    token: SlackApiToken,
}

impl SlackClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(token)),
        }
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, SlackError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, SlackError>> + Send,
        T: Send,
    {
        retry_transient(operation).await
    }

    /// # Errors
    ///
    /// Returns an error if the token is rejected or Slack cannot be reached.
    pub async fn auth_test(&self) -> Result<BotIdentity, SlackError> {
        self.with_retry(|| async {
            let session = connector()?.open_session(&self.token);
            let resp = session.auth_test().await?;

            Ok(BotIdentity {
                user_id: resp.user_id.0,
                team_id: resp.team_id.0,
            })
        })
        .await
    }

    /// Post a message to a channel and return its `ts`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Slack API call fails.
    pub async fn post_message(
        &self,
        channel_id: &str,
        message: &str,
    ) -> Result<String, SlackError> {
        self.with_retry(|| async {
            let session = connector()?.open_session(&self.token);

            let post_req = SlackApiChatPostMessageRequest::new(
                SlackChannelId(channel_id.to_string()),
                SlackMessageContent::new().with_text(message.to_string()),
            );

            let resp = session.chat_post_message(&post_req).await?;
            Ok(resp.ts.0)
        })
        .await
    }

    /// Post a plain-text reply into a specific thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the Slack API call fails.
    pub async fn post_message_in_thread(
        &self,
        channel_id: &str,
        thread_ts: &str,
        message: &str,
    ) -> Result<String, SlackError> {
        self.with_retry(|| async {
            let session = connector()?.open_session(&self.token);

            let post_req = SlackApiChatPostMessageRequest::new(
                SlackChannelId(channel_id.to_string()),
                SlackMessageContent::new().with_text(message.to_string()),
            )
            .with_thread_ts(SlackTs(thread_ts.to_string()));

            let resp = session.chat_post_message(&post_req).await?;
            Ok(resp.ts.0)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the Slack API call fails or response parsing fails.
    pub async fn get_user_im_channel(&self, user_id: &str) -> Result<String, SlackError> {
        self.with_retry(|| async {
            let session = connector()?.open_session(&self.token);
            let open_req = SlackApiConversationsOpenRequest::new()
                .with_users(vec![SlackUserId(user_id.to_string())]);

            let result = session.conversations_open(&open_req).await?;
            Ok(result.channel.id.0)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the DM channel cannot be opened or the post fails.
    pub async fn send_dm(&self, user_id: &str, message: &str) -> Result<String, SlackError> {
        let im_channel = self.get_user_im_channel(user_id).await?;
        self.post_message(&im_channel, message).await
    }

    /// POST a JSON payload to a command's or interaction's `response_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a Slack URL, the request fails, or Slack
    /// answers with a non-success status.
    pub async fn respond(&self, response_url: &str, payload: &Value) -> Result<(), SlackError> {
        let url = validate_response_url(response_url)?;

        self.with_retry(|| async {
            let resp = HTTP_CLIENT.post(url.clone()).json(payload).send().await?;

            let status = resp.status();
            if status.is_server_error() {
                return Err(SlackError::HttpError(format!("response_url HTTP {status}")));
            }
            if !status.is_success() {
                return Err(SlackError::ApiError(format!("response_url HTTP {status}")));
            }

            debug!("Posted reply via response_url");
            Ok(())
        })
        .await
    }
}
