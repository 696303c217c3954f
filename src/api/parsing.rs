use std::collections::HashMap;

use axum::http::HeaderMap;
use percent_encoding::percent_decode_str;
use serde_json::Value;

use crate::core::models::{InteractionPayload, SlashCommand};
use crate::errors::SlackError;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const RETRY_NUM_HEADER: &str = "x-slack-retry-num";
pub const RETRY_REASON_HEADER: &str = "x-slack-retry-reason";

/// Decodes a URL encoded form component.
///
/// `+` is decoded as a space, as in `application/x-www-form-urlencoded`.
///
/// # Errors
///
/// Returns `ParseError` if the decoded bytes are not valid UTF-8.
///
/// # Examples
///
/// ```
/// use slackhook::api::parsing::decode_url_component;
///
/// assert_eq!(decode_url_component("hello%20world").unwrap(), "hello world");
/// assert_eq!(decode_url_component("hello+world").unwrap(), "hello world");
/// ```
pub fn decode_url_component(input: &str) -> Result<String, SlackError> {
    // '+' must become a space before percent-decoding so an encoded "%2B" survives
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| SlackError::ParseError(format!("Failed to decode URL component: {e}")))
}

fn parse_form_pairs(form_body: &str) -> Result<HashMap<String, String>, SlackError> {
    let mut map = HashMap::new();
    for pair in form_body.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_val) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_url_component(raw_key)?;
        let value = decode_url_component(raw_val)?;
        map.entry(key).or_insert(value);
    }
    Ok(map)
}

/// First decoded value of `name` in a form-encoded body.
///
/// # Errors
///
/// Returns `ParseError` if the body contains an undecodable component.
pub fn form_field(form_body: &str, name: &str) -> Result<Option<String>, SlackError> {
    Ok(parse_form_pairs(form_body)?.remove(name))
}

/// Parses the form body of a slash command request.
///
/// Missing fields are left empty.
///
/// # Errors
///
/// Returns `ParseError` if the body contains an undecodable component.
///
/// # Examples
///
/// ```
/// use slackhook::api::parsing::parse_form_data;
///
/// let form_data = "token=abc123&team_id=T123&team_domain=example&\
///                  channel_id=C123&channel_name=general&user_id=U123&\
///                  user_name=username&command=%2Fhook&text=&\
///                  response_url=https%3A%2F%2Fhooks.slack.com%2F&\
///                  trigger_id=123.456&command_ts=1609753200";
///
/// let command = parse_form_data(form_data).unwrap();
/// assert_eq!(command.command, "/hook");
/// assert_eq!(command.channel_name, "general");
/// ```
pub fn parse_form_data(form_body: &str) -> Result<SlashCommand, SlackError> {
    let mut map = parse_form_pairs(form_body)?;
    let mut take = |key: &str| map.remove(key).unwrap_or_default();

    Ok(SlashCommand {
        token: take("token"),
        team_id: take("team_id"),
        team_domain: take("team_domain"),
        channel_id: take("channel_id"),
        channel_name: take("channel_name"),
        user_id: take("user_id"),
        user_name: take("user_name"),
        command: take("command"),
        text: take("text"),
        response_url: take("response_url"),
        trigger_id: take("trigger_id"),
        command_ts: take("command_ts"),
    })
}

#[must_use]
pub fn is_interactive_body(body: &str) -> bool {
    body.starts_with("payload=") || body.contains("&payload=")
}

/// Decodes the JSON `payload` field of an interactive component request.
///
/// # Errors
///
/// Returns `ParseError` if the field is missing or is not a valid payload.
pub fn parse_interactive_payload(form_body: &str) -> Result<InteractionPayload, SlackError> {
    let raw = form_field(form_body, "payload")?
        .ok_or_else(|| SlackError::ParseError("Missing payload field".to_string()))?;
    serde_json::from_str(&raw)
        .map_err(|e| SlackError::ParseError(format!("Invalid JSON payload: {e}")))
}

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(Value::as_str)
}

/// Header value as a string; `HeaderMap` lookups are case-insensitive.
pub fn get_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Slack's redelivery marker for an Events API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryInfo {
    pub num: u32,
    pub reason: Option<String>,
}

#[must_use]
pub fn retry_info(headers: &HeaderMap) -> Option<RetryInfo> {
    let num = get_header_value(headers, RETRY_NUM_HEADER)?.trim().parse().ok()?;
    let reason = get_header_value(headers, RETRY_REASON_HEADER).map(ToString::to_string);
    Some(RetryInfo { num, reason })
}
