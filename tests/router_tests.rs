use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use slackhook::api::signature::compute_signature;
use slackhook::api::{AppState, build_router};
use slackhook::core::config::AppConfig;
use slackhook::core::models::{
    AppMentionEvent, CommandReply, InteractionPayload, MessageEvent, SlashCommand,
};
use slackhook::errors::SlackError;
use slackhook::handler::{EventHandler, HandlerContext};
use tokio::sync::mpsc;
use tower::ServiceExt;

const SECRET: &str = "router_test_secret";

/// Reports every call on a channel so tests can wait for background dispatch.
struct ChannelHandler {
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl EventHandler for ChannelHandler {
    async fn on_message(
        &self,
        _ctx: &HandlerContext,
        message: &MessageEvent,
    ) -> Result<(), SlackError> {
        let _ = self.tx.send(format!("message:{}", message.text.as_deref().unwrap_or("")));
        Ok(())
    }

    async fn on_app_mention(
        &self,
        _ctx: &HandlerContext,
        mention: &AppMentionEvent,
    ) -> Result<(), SlackError> {
        let _ = self.tx.send(format!("mention:{}", mention.user));
        Ok(())
    }

    async fn on_slash_command(
        &self,
        _ctx: &HandlerContext,
        command: &SlashCommand,
    ) -> Result<Option<CommandReply>, SlackError> {
        match command.text.as_str() {
            "quiet" => Ok(None),
            "fail" => Err(SlackError::GeneralError("boom".to_string())),
            "slow" => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                let _ = self.tx.send("command:slow-done".to_string());
                Ok(Some(CommandReply::ephemeral("too late")))
            }
            text => Ok(Some(CommandReply::in_channel(format!("echo {text}")))),
        }
    }

    async fn on_interaction(
        &self,
        _ctx: &HandlerContext,
        payload: &InteractionPayload,
    ) -> Result<(), SlackError> {
        let _ = self.tx.send(format!("interaction:{:?}", payload.kind));
        Ok(())
    }
}

fn test_app(extra: &[(&str, &str)]) -> (Router, mpsc::UnboundedReceiver<String>) {
    let mut pairs = vec![
        ("SLACK_SIGNING_SECRET".to_string(), SECRET.to_string()),
        ("SLACK_BOT_TOKEN".to_string(), "xoxb-test".to_string()),
        ("ACK_TIMEOUT_MS".to_string(), "200".to_string()),
        ("MAX_BODY_BYTES".to_string(), "4096".to_string()),
    ];
    pairs.extend(extra.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));

    let config = AppConfig::from_lookup(|key| {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let state = AppState::new(config, Arc::new(ChannelHandler { tx }));
    (build_router(state), rx)
}

fn signed_request(uri: &str, content_type: &str, body: &str) -> Request<Body> {
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = compute_signature(&timestamp, body.as_bytes(), SECRET);

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", content_type)
        .header("X-Slack-Request-Timestamp", timestamp)
        .header("X-Slack-Signature", signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn events_request(body: &Value) -> Request<Body> {
    signed_request("/slack/events", "application/json", &body.to_string())
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

async fn next_call(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("handler was not called")
        .expect("channel closed")
}

fn message_callback(event_id: &str, text: &str) -> Value {
    json!({
        "type": "event_callback",
        "team_id": "T1",
        "event_id": event_id,
        "event_time": 1,
        "event": {"type": "message", "channel": "C1", "user": "U1", "text": text, "ts": "1.0"},
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _rx) = test_app(&[]);
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_url_verification_echoes_challenge() {
    let (app, _rx) = test_app(&[]);
    let req = events_request(&json!({
        "type": "url_verification",
        "token": "t",
        "challenge": "challenge-123",
    }));

    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "challenge-123");
}

#[tokio::test]
async fn test_unsigned_requests_are_rejected() {
    let (app, _rx) = test_app(&[]);

    let missing = Request::builder()
        .method("POST")
        .uri("/slack/events")
        .body(Body::from("{}"))
        .unwrap();
    let resp = app.clone().oneshot(missing).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let mut forged = events_request(&json!({"type": "url_verification", "challenge": "x"}));
    forged.headers_mut().insert(
        "x-slack-signature",
        "v0=0000000000000000000000000000000000000000000000000000000000000000"
            .parse()
            .unwrap(),
    );
    let resp = app.clone().oneshot(forged).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body = r#"{"type":"url_verification","challenge":"x"}"#;
    let old = "1000000000";
    let stale = Request::builder()
        .method("POST")
        .uri("/slack/events")
        .header("X-Slack-Request-Timestamp", old)
        .header("X-Slack-Signature", compute_signature(old, body.as_bytes(), SECRET))
        .body(Body::from(body))
        .unwrap();
    let resp = app.oneshot(stale).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_skip_signature_check() {
    let (app, _rx) = test_app(&[("SLACK_SKIP_SIGNATURE_CHECK", "true")]);
    let req = Request::builder()
        .method("POST")
        .uri("/slack/events")
        .body(Body::from(r#"{"type":"url_verification","challenge":"dev"}"#))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "dev");
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let (app, _rx) = test_app(&[]);
    let req = signed_request("/slack/events", "application/json", "{not json");

    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (app, _rx) = test_app(&[]);
    let req = signed_request("/slack/events", "application/json", &"x".repeat(8192));

    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_event_callback_is_acked_and_dispatched() {
    let (app, mut rx) = test_app(&[]);

    let resp = app
        .oneshot(events_request(&message_callback("Ev1", "hello")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(next_call(&mut rx).await, "message:hello");
}

#[tokio::test]
async fn test_redelivered_event_is_dispatched_once() {
    let (app, mut rx) = test_app(&[]);
    let body = message_callback("EvDup", "once");

    let resp = app.clone().oneshot(events_request(&body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mut retry = events_request(&body);
    retry
        .headers_mut()
        .insert("x-slack-retry-num", "1".parse().unwrap());
    retry
        .headers_mut()
        .insert("x-slack-retry-reason", "http_timeout".parse().unwrap());
    let resp = app.clone().oneshot(retry).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(next_call(&mut rx).await, "message:once");
    assert!(
        tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .is_err(),
        "retry should not be dispatched again"
    );
}

#[tokio::test]
async fn test_bot_messages_are_not_dispatched() {
    let (app, mut rx) = test_app(&[]);
    let body = json!({
        "type": "event_callback",
        "event_id": "EvBot",
        "event": {"type": "message", "channel": "C1", "bot_id": "B1", "text": "loop", "ts": "1.0"},
    });

    let resp = app.clone().oneshot(events_request(&body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mention = json!({
        "type": "event_callback",
        "event_id": "EvMention",
        "event": {"type": "app_mention", "channel": "C1", "user": "U9", "text": "hi", "ts": "2.0"},
    });
    app.oneshot(events_request(&mention)).await.unwrap();

    // Only the mention arrives
    assert_eq!(next_call(&mut rx).await, "mention:U9");
}

fn command_body(text: &str) -> String {
    format!(
        "token=t&team_id=T1&channel_id=C1&user_id=U1&command=%2Fhook&text={text}&response_url=&trigger_id=1.2"
    )
}

#[tokio::test]
async fn test_slash_command_inline_reply() {
    let (app, _rx) = test_app(&[]);
    let req = signed_request(
        "/slack/commands",
        "application/x-www-form-urlencoded",
        &command_body("hello"),
    );

    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({"response_type": "in_channel", "text": "echo hello"})
    );
}

#[tokio::test]
async fn test_slash_command_without_reply_is_empty_ack() {
    let (app, _rx) = test_app(&[]);
    let req = signed_request(
        "/slack/commands",
        "application/x-www-form-urlencoded",
        &command_body("quiet"),
    );

    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "");
}

#[tokio::test]
async fn test_slash_command_failure_is_ephemeral_with_reference() {
    let (app, _rx) = test_app(&[]);
    let req = signed_request(
        "/slack/commands",
        "application/x-www-form-urlencoded",
        &command_body("fail"),
    );

    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["response_type"], "ephemeral");
    assert!(json["text"].as_str().unwrap().contains("(ref: "));
}

#[tokio::test]
async fn test_slow_slash_command_is_acked_before_deadline() {
    let (app, _rx) = test_app(&[]);
    let req = signed_request(
        "/slack/commands",
        "application/x-www-form-urlencoded",
        &command_body("slow"),
    );

    let started = std::time::Instant::now();
    let resp = app.oneshot(req).await.unwrap();

    assert!(started.elapsed() < Duration::from_millis(450));
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "");
}

#[tokio::test]
async fn test_slow_slash_command_keeps_running_after_ack() {
    let (app, mut rx) = test_app(&[]);
    let req = signed_request(
        "/slack/commands",
        "application/x-www-form-urlencoded",
        &command_body("slow"),
    );

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(body_string(resp).await, "");

    // The handler is not cancelled by the ack; its reply takes the late path.
    assert_eq!(next_call(&mut rx).await, "command:slow-done");
}

/// Send a mention and check it is the first thing the handler saw.
async fn assert_first_dispatch_is_mention(app: Router, rx: &mut mpsc::UnboundedReceiver<String>) {
    let mention = json!({
        "type": "event_callback",
        "event_id": "EvAfter",
        "event": {"type": "app_mention", "channel": "C1", "user": "U7", "text": "hi", "ts": "3.0"},
    });
    app.oneshot(events_request(&mention)).await.unwrap();

    assert_eq!(next_call(rx).await, "mention:U7");
}

#[tokio::test]
async fn test_app_rate_limited_is_acked_without_dispatch() {
    let (app, mut rx) = test_app(&[]);
    let body = json!({
        "type": "app_rate_limited",
        "team_id": "T1",
        "minute_rate_limited": 1_518_467_820,
        "api_app_id": "A1",
    });

    let resp = app.clone().oneshot(events_request(&body)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "");
    assert_first_dispatch_is_mention(app, &mut rx).await;
}

#[tokio::test]
async fn test_unknown_envelope_is_acked_without_dispatch() {
    let (app, mut rx) = test_app(&[]);
    let body = json!({"type": "something_new", "team_id": "T1"});

    let resp = app.clone().oneshot(events_request(&body)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "");
    assert_first_dispatch_is_mention(app, &mut rx).await;
}

#[tokio::test]
async fn test_slash_command_requires_command_field() {
    let (app, _rx) = test_app(&[]);
    let req = signed_request(
        "/slack/commands",
        "application/x-www-form-urlencoded",
        "text=hello&user_id=U1",
    );

    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_interaction_is_acked_and_dispatched() {
    let (app, mut rx) = test_app(&[]);
    let body = "payload=%7B%22type%22%3A%22block_actions%22%2C%22actions%22%3A%5B%5D%7D";
    let req = signed_request("/slack/interactive", "application/x-www-form-urlencoded", body);

    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(next_call(&mut rx).await, "interaction:BlockActions");
}

#[tokio::test]
async fn test_interaction_without_payload_is_bad_request() {
    let (app, _rx) = test_app(&[]);

    let req = signed_request(
        "/slack/interactive",
        "application/x-www-form-urlencoded",
        "command=%2Fhook",
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = signed_request(
        "/slack/interactive",
        "application/x-www-form-urlencoded",
        "payload=%7Bbroken",
    );
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
