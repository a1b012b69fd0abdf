//! Tests for the status server: endpoints through the router, lifecycle on a real socket.

use super::*;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use weaver_core::config::HealthConfig;
use weaver_tools::UiCommand;

/// Echoes the message, queues one UI command, and remembers what it saw.
#[derive(Default)]
struct RecordingProcessor {
    seen: Mutex<Option<(ChatTurn, CancellationToken)>>,
}

#[async_trait::async_trait]
impl ChatProcessor for RecordingProcessor {
    async fn process(
        &self,
        cancel: CancellationToken,
        turn: &ChatTurn,
    ) -> Result<ChatReply, ChatError> {
        *self.seen.lock().unwrap() = Some((turn.clone(), cancel));
        Ok(ChatReply {
            response: format!("echo: {}", turn.message),
            ui_commands: vec![UiCommand::new("create_node", Default::default())],
        })
    }
}

struct FailingProcessor {
    reason: &'static str,
}

#[async_trait::async_trait]
impl ChatProcessor for FailingProcessor {
    async fn process(
        &self,
        _cancel: CancellationToken,
        _turn: &ChatTurn,
    ) -> Result<ChatReply, ChatError> {
        Err(ChatError::with_partial(
            ChatReply {
                response: "partial".to_string(),
                ui_commands: Vec::new(),
            },
            anyhow::anyhow!(self.reason),
        ))
    }
}

fn local_config() -> HealthConfig {
    HealthConfig::default().with_overrides(Some("127.0.0.1".to_string()), Some(0))
}

fn server_with(processor: Arc<dyn ChatProcessor>) -> HealthServer {
    HealthServer::new(local_config(), processor)
}

fn server() -> HealthServer {
    server_with(Arc::new(RecordingProcessor::default()))
}

async fn send(server: &HealthServer, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = server.router().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body)
}

async fn send_json(server: &HealthServer, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(server, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

fn post(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn wait_for_phase(server: &HealthServer, phase: ServerPhase) {
    for _ in 0..500 {
        if server.phase() == phase {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("server never reached {:?} (now {:?})", phase, server.phase());
}

// ─── /health ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_ok_regardless_of_readiness_and_checks() {
    let server = server();
    server.register_check("db", || (false, "connection refused".to_string()));

    let (status, body) = send_json(&server, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["uptime"].is_string());
    assert!(body.get("checks").is_none());

    server.set_ready(true);
    let (status, _) = send_json(&server, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

// ─── /ready ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ready_not_ready_with_empty_checks() {
    let server = server();
    server.set_ready(false);

    let (status, body) = send_json(&server, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not ready");
    assert_eq!(body["checks"], json!({}));
    assert!(body.get("uptime").is_none());
}

#[tokio::test]
async fn test_ready_when_flag_set_and_checks_pass() {
    let server = server();
    server.set_ready(true);
    server.register_check("db", || (true, String::new()));

    let (status, body) = send_json(&server, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert!(body["uptime"].is_string());
    assert_eq!(body["checks"]["db"]["status"], "ok");
    assert_eq!(body["checks"]["db"]["name"], "db");
    assert!(body["checks"]["db"].get("message").is_none());
}

#[tokio::test]
async fn test_ready_reports_all_checks_when_one_fails() {
    let server = server();
    server.set_ready(true);
    server.register_check("db", || (true, "pool warm".to_string()));
    server.register_check("cache", || (false, "redis unreachable".to_string()));

    let (status, body) = send_json(&server, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not ready");
    assert_eq!(body["checks"]["db"]["status"], "ok");
    assert_eq!(body["checks"]["cache"]["status"], "fail");
    assert_eq!(body["checks"]["cache"]["message"], "redis unreachable");
}

#[tokio::test]
async fn test_ready_matches_flag_and_checks_for_check_sequences() {
    let sequences: &[&[(&str, bool)]] = &[
        &[],
        &[("a", true)],
        &[("a", false)],
        &[("a", false), ("a", true)],
        &[("a", true), ("a", false)],
        &[("a", true), ("b", false), ("b", true)],
        &[("a", true), ("b", true), ("c", false)],
    ];

    for ready in [false, true] {
        for seq in sequences {
            let server = server();
            server.set_ready(ready);
            let mut last = std::collections::HashMap::new();
            for (name, passed) in seq.iter() {
                server.register_check(*name, || (*passed, String::new()));
                last.insert(*name, *passed);
            }
            let any_failing = last.values().any(|passed| !passed);

            let (status, _) = send(&server, get("/ready")).await;
            let expected = if !ready || any_failing {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::OK
            };
            assert_eq!(status, expected, "ready={} seq={:?}", ready, seq);
        }
    }
}

// ─── register_check ─────────────────────────────────────────────────────────

#[test]
fn test_register_check_overwrites_previous_entry() {
    let server = server();
    server.register_check("disk", || (false, "98% full".to_string()));
    let first = server.checks()["disk"].clone();

    server.register_check("disk", || (true, "40% full".to_string()));
    let checks = server.checks();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks["disk"].status, CheckStatus::Ok);
    assert_eq!(checks["disk"].message, "40% full");
    assert!(checks["disk"].timestamp >= first.timestamp);
}

#[test]
fn test_concurrent_register_same_name_leaves_one_whole_entry() {
    let server = server();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let server = server.clone();
            std::thread::spawn(move || {
                for n in 0..200 {
                    let passed = (i + n) % 2 == 0;
                    let label = if passed { "ok" } else { "fail" };
                    server.register_check("x", move || (passed, format!("{}-{}-{}", label, i, n)));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let checks = server.checks();
    assert_eq!(checks.len(), 1);
    let x = &checks["x"];
    assert_eq!(x.name, "x");
    match x.status {
        CheckStatus::Ok => assert!(x.message.starts_with("ok-")),
        CheckStatus::Fail => assert!(x.message.starts_with("fail-")),
    }
}

// ─── /chat ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_applies_defaults() {
    let processor = Arc::new(RecordingProcessor::default());
    let server = server_with(processor.clone());

    let (status, body) = send_json(&server, post("/chat", r#"{"message":"hi"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "echo: hi");
    assert_eq!(body["ui_commands"][0]["command"], "create_node");
    assert!(body.get("error").is_none());

    let (turn, cancel) = processor.seen.lock().unwrap().take().unwrap();
    assert_eq!(
        turn,
        ChatTurn {
            session_key: "rest:default".to_string(),
            message: "hi".to_string(),
            channel: "rest".to_string(),
            chat_id: "api".to_string(),
        }
    );
    // Request scope ended with the response.
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn test_chat_keeps_provided_fields() {
    let processor = Arc::new(RecordingProcessor::default());
    let server = server_with(processor.clone());

    let body = r#"{"session_key":"tg:42","message":"status?","channel":"telegram","chat_id":"42","extra":true}"#;
    let (status, _) = send_json(&server, post("/chat", body)).await;
    assert_eq!(status, StatusCode::OK);

    let (turn, _) = processor.seen.lock().unwrap().take().unwrap();
    assert_eq!(turn.session_key, "tg:42");
    assert_eq!(turn.channel, "telegram");
    assert_eq!(turn.chat_id, "42");
}

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let server = server();
    for body in ["{}", r#"{"message":""}"#, r#"{"message":null,"channel":"x"}"#] {
        let (status, text) = send(&server, post("/chat", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(&text[..], b"Empty message");
    }
}

#[tokio::test]
async fn test_chat_rejects_undecodable_body() {
    let server = server();
    for body in [
        "",
        "not json",
        r#"{"message": 5}"#,
        r#""hi""#,
        r#"["sk","hi"]"#,
        "[]",
    ] {
        let (status, text) = send(&server, post("/chat", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        assert_eq!(&text[..], b"Invalid request");
    }
}

#[tokio::test]
async fn test_chat_wrong_method() {
    let server = server();
    let (status, text) = send(&server, get("/chat")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(&text[..], b"Method not allowed");
}

#[tokio::test]
async fn test_chat_processor_error_is_still_200() {
    let server = server_with(Arc::new(FailingProcessor {
        reason: "model quota exceeded",
    }));

    let (status, body) = send_json(&server, post("/chat", r#"{"message":"hi"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "partial");
    assert_eq!(body["error"], "model quota exceeded");
    assert!(body.get("ui_commands").is_none());
}

#[tokio::test]
async fn test_chat_processor_error_text_never_empty() {
    let server = server_with(Arc::new(FailingProcessor { reason: "" }));

    let (status, body) = send_json(&server, post("/chat", r#"{"message":"hi"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "chat processing failed");
}

// ─── Lifecycle ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_with_cancel_serves_then_shuts_down() {
    let server = server();
    assert_eq!(server.phase(), ServerPhase::NotStarted);
    assert!(!server.is_ready());

    let cancel = CancellationToken::new();
    let running = tokio::spawn({
        let server = server.clone();
        let cancel = cancel.clone();
        async move { server.start_with_cancel(cancel).await }
    });

    wait_for_phase(&server, ServerPhase::Ready).await;
    assert!(server.is_ready());
    let addr = server.local_addr().unwrap();
    assert_ne!(addr.port(), 0);
    tokio::net::TcpStream::connect(addr).await.unwrap();

    let again = server.start().await;
    assert!(matches!(
        again,
        Err(HealthServerError::InvalidPhase(ServerPhase::Ready))
    ));

    cancel.cancel();
    running.await.unwrap().unwrap();
    assert_eq!(server.phase(), ServerPhase::Stopped);
    assert!(!server.is_ready());
}

#[tokio::test]
async fn test_stop_ends_blocking_start() {
    let server = server();
    let running = tokio::spawn({
        let server = server.clone();
        async move { server.start().await }
    });

    wait_for_phase(&server, ServerPhase::Ready).await;
    server.stop().await;
    assert_eq!(server.phase(), ServerPhase::Stopped);
    assert!(!server.is_ready());
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_stop_before_start() {
    let server = server();
    server.stop().await;
    assert_eq!(server.phase(), ServerPhase::Stopped);
    assert!(matches!(
        server.start().await,
        Err(HealthServerError::InvalidPhase(ServerPhase::Stopped))
    ));
}

#[tokio::test]
async fn test_bind_failure_propagates_and_resets_phase() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();
    let server = HealthServer::new(
        HealthConfig::default().with_overrides(Some("127.0.0.1".to_string()), Some(port)),
        Arc::new(RecordingProcessor::default()),
    );

    let err = server.start().await.unwrap_err();
    assert!(matches!(err, HealthServerError::Bind { .. }));
    assert!(err.to_string().contains(&port.to_string()));
    assert_eq!(server.phase(), ServerPhase::NotStarted);
    assert!(!server.is_ready());
}

#[tokio::test]
async fn test_start_with_cancel_bind_failure_returns_error() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();
    let server = HealthServer::new(
        HealthConfig::default().with_overrides(Some("127.0.0.1".to_string()), Some(port)),
        Arc::new(RecordingProcessor::default()),
    );

    let cancel = CancellationToken::new();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        server.start_with_cancel(cancel.clone()),
    )
    .await
    .expect("start_with_cancel must return on bind failure without cancellation");
    let err = result.unwrap_err();
    assert!(matches!(err, HealthServerError::Bind { .. }));
    assert!(err.to_string().contains(&port.to_string()));
    assert!(!cancel.is_cancelled());
    assert_eq!(server.phase(), ServerPhase::NotStarted);
    assert!(!server.is_ready());
}
