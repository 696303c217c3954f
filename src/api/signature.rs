use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::error;

use crate::errors::SlackError;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_VERSION: &str = "v0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("request timestamp is not an integer")]
    MalformedTimestamp,

    #[error("request timestamp is outside the allowed window")]
    Stale,

    #[error("signature is not a v0 hex digest")]
    Malformed,

    #[error("signature does not match request body")]
    Mismatch,
}

impl From<SignatureError> for SlackError {
    fn from(error: SignatureError) -> Self {
        SlackError::SignatureError(error.to_string())
    }
}

/// Verify the `X-Slack-Signature` of a request.
///
/// `now_secs` is the current Unix time; requests whose timestamp differs from it
/// by more than `tolerance_secs` are rejected as possible replays.
///
/// # Errors
///
/// Returns the first check that failed.
pub fn verify_slack_signature(
    request_body: &[u8],
    timestamp: &str,
    signature: &str,
    signing_secret: &str,
    tolerance_secs: i64,
    now_secs: i64,
) -> Result<(), SignatureError> {
    let ts: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::MalformedTimestamp)?;

    if now_secs.abs_diff(ts) > tolerance_secs.unsigned_abs() {
        error!(timestamp = ts, now = now_secs, "Timestamp out of range, potential replay attack");
        return Err(SignatureError::Stale);
    }

    let expected = signature
        .strip_prefix("v0=")
        .and_then(|digest| hex::decode(digest).ok())
        .ok_or(SignatureError::Malformed)?;

    let Ok(mut mac) = HmacSha256::new_from_slice(signing_secret.as_bytes()) else {
        return Err(SignatureError::Mismatch);
    };
    mac.update(base_string_prefix(timestamp).as_bytes());
    mac.update(request_body);

    // verify_slice compares in constant time
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Compute the `v0=` signature Slack would send for `request_body`.
#[must_use]
pub fn compute_signature(timestamp: &str, request_body: &[u8], signing_secret: &str) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(signing_secret.as_bytes()) else {
        return String::new();
    };
    mac.update(base_string_prefix(timestamp).as_bytes());
    mac.update(request_body);
    format!(
        "{SIGNATURE_VERSION}={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

fn base_string_prefix(timestamp: &str) -> String {
    format!("{SIGNATURE_VERSION}:{timestamp}:")
}
