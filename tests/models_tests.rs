use serde_json::json;
use slackhook::core::models::{EventEnvelope, ReplyVisibility, CommandReply, SlackEvent};

fn callback(event: serde_json::Value) -> EventEnvelope {
    serde_json::from_value(json!({
        "type": "event_callback",
        "token": "ignored",
        "team_id": "T1",
        "api_app_id": "A1",
        "event_id": "Ev1",
        "event_time": 1_700_000_000,
        "authorizations": [],
        "event": event,
    }))
    .unwrap()
}

#[test]
fn test_url_verification() {
    let envelope: EventEnvelope = serde_json::from_value(json!({
        "type": "url_verification",
        "token": "t",
        "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P",
    }))
    .unwrap();

    match envelope {
        EventEnvelope::UrlVerification { challenge, token } => {
            assert_eq!(challenge, "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P");
            assert_eq!(token.as_deref(), Some("t"));
        }
        other => panic!("Unexpected envelope: {other:?}"),
    }
}

#[test]
fn test_unknown_envelope_type() {
    let envelope: EventEnvelope =
        serde_json::from_value(json!({ "type": "something_new", "x": 1 })).unwrap();
    assert!(matches!(envelope, EventEnvelope::Unknown));
}

#[test]
fn test_app_rate_limited() {
    let envelope: EventEnvelope = serde_json::from_value(json!({
        "type": "app_rate_limited",
        "team_id": "T1",
        "minute_rate_limited": 1_518_467_820,
        "api_app_id": "A1",
    }))
    .unwrap();
    assert!(matches!(
        envelope,
        EventEnvelope::AppRateLimited { minute_rate_limited: 1_518_467_820, .. }
    ));
}

#[test]
fn test_message_event() {
    let EventEnvelope::EventCallback(cb) = callback(json!({
        "type": "message",
        "channel": "D1",
        "user": "U1",
        "text": "hello",
        "ts": "1700000000.000100",
        "channel_type": "im",
    })) else {
        panic!("expected event_callback");
    };

    assert_eq!(cb.event_id, "Ev1");
    assert_eq!(cb.team_id, "T1");
    assert_eq!(cb.event_type(), "message");

    match cb.parse_event().unwrap() {
        SlackEvent::Message(message) => {
            assert_eq!(message.channel, "D1");
            assert_eq!(message.text.as_deref(), Some("hello"));
            assert!(message.is_user_message());
            assert!(!message.is_from_bot());
            assert_eq!(message.reply_thread_ts(), "1700000000.000100");
        }
        other => panic!("Unexpected event: {other:?}"),
    }
}

#[test]
fn test_bot_and_threaded_messages() {
    let EventEnvelope::EventCallback(cb) = callback(json!({
        "type": "message",
        "subtype": "bot_message",
        "channel": "C1",
        "ts": "2.0",
        "thread_ts": "1.0",
    })) else {
        panic!("expected event_callback");
    };

    let SlackEvent::Message(message) = cb.parse_event().unwrap() else {
        panic!("expected message");
    };
    assert!(message.is_from_bot());
    assert!(!message.is_user_message());
    assert_eq!(message.reply_thread_ts(), "1.0");
}

#[test]
fn test_app_mention_and_assistant_thread() {
    let EventEnvelope::EventCallback(cb) = callback(json!({
        "type": "app_mention",
        "channel": "C1",
        "user": "U1",
        "text": "<@U0BOT> hi",
        "ts": "1.0",
    })) else {
        panic!("expected event_callback");
    };
    assert!(matches!(cb.parse_event().unwrap(), SlackEvent::AppMention(m) if m.user == "U1"));

    let EventEnvelope::EventCallback(cb) = callback(json!({
        "type": "assistant_thread_started",
        "assistant_thread": { "channel_id": "D1", "thread_ts": "1.0", "user_id": "U1" },
    })) else {
        panic!("expected event_callback");
    };
    assert!(matches!(
        cb.parse_event().unwrap(),
        SlackEvent::AssistantThreadStarted { assistant_thread }
            if assistant_thread.channel_id == "D1"
    ));
}

#[test]
fn test_unknown_inner_event_is_not_an_error() {
    let EventEnvelope::EventCallback(cb) = callback(json!({
        "type": "reaction_added",
        "user": "U1",
        "reaction": "thumbsup",
    })) else {
        panic!("expected event_callback");
    };

    assert_eq!(cb.event_type(), "reaction_added");
    assert!(matches!(cb.parse_event().unwrap(), SlackEvent::Unknown));
    // Raw event stays available to handlers
    assert_eq!(cb.event["reaction"], "thumbsup");
}

#[test]
fn test_malformed_known_event_is_a_parse_error() {
    let EventEnvelope::EventCallback(cb) = callback(json!({
        "type": "assistant_thread_started",
    })) else {
        panic!("expected event_callback");
    };
    assert!(cb.parse_event().is_err());
}

#[test]
fn test_command_reply_constructors() {
    assert_eq!(
        CommandReply::ephemeral("a").visibility,
        ReplyVisibility::Ephemeral
    );
    assert_eq!(
        CommandReply::in_channel("b").visibility,
        ReplyVisibility::InChannel
    );
}
