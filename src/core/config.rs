use std::env;
use std::net::SocketAddr;

use crate::errors::SlackError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_signing_secret: String,
    pub slack_bot_token: String,
    pub bind_address: String,
    pub port: u16,
    /// Maximum allowed skew between `X-Slack-Request-Timestamp` and now.
    pub signature_tolerance_secs: i64,
    /// How long a slash command handler may run before the request is acked.
    pub ack_timeout_ms: u64,
    pub max_body_bytes: usize,
    pub dedup_capacity: usize,
    /// Local development only.
    pub skip_signature_check: bool,
    pub ignore_bot_messages: bool,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value does not parse.
    pub fn from_env() -> Result<Self, SlackError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required key is missing or a value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SlackError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| SlackError::ConfigError(format!("{key} is not set")))
        };

        Ok(Self {
            slack_signing_secret: required("SLACK_SIGNING_SECRET")?,
            slack_bot_token: required("SLACK_BOT_TOKEN")?,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            signature_tolerance_secs: parse_or(&lookup, "SIGNATURE_TOLERANCE_SECS", 300)?,
            ack_timeout_ms: parse_or(&lookup, "ACK_TIMEOUT_MS", 2500)?,
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", 1024 * 1024)?,
            dedup_capacity: parse_or(&lookup, "DEDUP_CAPACITY", 1024)?,
            skip_signature_check: parse_flag(&lookup, "SLACK_SKIP_SIGNATURE_CHECK", false),
            ignore_bot_messages: parse_flag(&lookup, "IGNORE_BOT_MESSAGES", true),
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if `BIND_ADDRESS:PORT` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, SlackError> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| SlackError::ConfigError(format!("BIND_ADDRESS/PORT: {e}")))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, SlackError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| SlackError::ConfigError(format!("{key}: {e}"))),
        _ => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1" | "yes") => true,
        Some("false" | "0" | "no") => false,
        _ => default,
    }
}
