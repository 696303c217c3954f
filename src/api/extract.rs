//! Extractor that only yields request bodies carrying a valid Slack signature.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::helpers::err_response;
use super::parsing::{SIGNATURE_HEADER, TIMESTAMP_HEADER, get_header_value};
use super::signature::verify_slack_signature;
use super::state::AppState;
use crate::errors::SlackError;

/// Raw request body plus headers, after signature verification.
#[derive(Debug)]
pub struct VerifiedBody {
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl VerifiedBody {
    /// The body as UTF-8; Slack only ever sends JSON or form-encoded text.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the body is not valid UTF-8.
    pub fn text(&self) -> Result<&str, SlackError> {
        std::str::from_utf8(&self.body)
            .map_err(|e| SlackError::ParseError(format!("Body is not UTF-8: {e}")))
    }
}

impl FromRequest<AppState> for VerifiedBody {
    type Rejection = Response;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let headers = req.headers().clone();
        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if !state.config.skip_signature_check {
            let Some(signature) = get_header_value(&headers, SIGNATURE_HEADER) else {
                warn!("Missing X-Slack-Signature header");
                return Err(err_response(
                    StatusCode::UNAUTHORIZED,
                    "Missing X-Slack-Signature header",
                ));
            };

            let Some(timestamp) = get_header_value(&headers, TIMESTAMP_HEADER) else {
                warn!("Missing X-Slack-Request-Timestamp header");
                return Err(err_response(
                    StatusCode::UNAUTHORIZED,
                    "Missing X-Slack-Request-Timestamp header",
                ));
            };

            verify_slack_signature(
                &body,
                timestamp,
                signature,
                &state.config.slack_signing_secret,
                state.config.signature_tolerance_secs,
                chrono::Utc::now().timestamp(),
            )
            .map_err(|e| {
                warn!(reason = %e, "Slack signature verification failed");
                SlackError::from(e).into_response()
            })?;

            debug!("Slack signature verified");
        }

        #[cfg(feature = "debug-logs")]
        debug!(body = %String::from_utf8_lossy(&body), "Request body");
        #[cfg(not(feature = "debug-logs"))]
        debug!(
            bytes = body.len(),
            "Request body [content masked, enable debug-logs feature to view]"
        );

        Ok(Self { headers, body })
    }
}
