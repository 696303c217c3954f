use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use slack_morphism::errors::SlackClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Failed to parse Slack event: {0}")]
    ParseError(String),

    #[error("Failed to access Slack API: {0}")]
    ApiError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Slack signature verification failed: {0}")]
    SignatureError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl SlackError {
    /// HTTP status reported back to Slack when this error ends a request.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            SlackError::ParseError(_) => StatusCode::BAD_REQUEST,
            SlackError::SignatureError(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether repeating the call that produced this error might succeed.
    ///
    /// Only transport failures qualify. Slack rejecting a request (`invalid_auth`,
    /// `channel_not_found`, a 4xx from a `response_url`) fails the same way again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SlackError::HttpError(_))
    }
}

impl IntoResponse for SlackError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<SlackClientError> for SlackError {
    fn from(error: SlackClientError) -> Self {
        match error {
            SlackClientError::ApiError(_) | SlackClientError::ProtocolError(_) => {
                SlackError::ApiError(error.to_string())
            }
            // Connection, protocol and rate-limit failures
            _ => SlackError::HttpError(error.to_string()),
        }
    }
}

impl From<reqwest::Error> for SlackError {
    fn from(error: reqwest::Error) -> Self {
        SlackError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(error: serde_json::Error) -> Self {
        SlackError::ParseError(error.to_string())
    }
}

impl From<anyhow::Error> for SlackError {
    fn from(error: anyhow::Error) -> Self {
        SlackError::ApiError(error.to_string())
    }
}
