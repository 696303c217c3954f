//! Common helper functions for API handlers.
//!
//! Response builders shared by the endpoint handlers.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

// ============================================================================
// Response Builders
// ============================================================================

/// Returns a 200 OK response with an empty body.
///
/// For slash commands this shows nothing to the user; for modal submissions
/// it closes the modal.
#[must_use]
pub fn ok_empty() -> Response {
    StatusCode::OK.into_response()
}

/// Returns a 200 OK response with a JSON body.
#[must_use]
pub fn ok_json(body: Value) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

/// Returns the `url_verification` challenge echoed back as plain text.
#[must_use]
pub fn challenge(value: &str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        value.to_string(),
    )
        .into_response()
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// First eight characters of a correlation id, short enough to show users.
#[must_use]
pub fn short_ref(correlation_id: &str) -> &str {
    correlation_id.get(..8).unwrap_or(correlation_id)
}
