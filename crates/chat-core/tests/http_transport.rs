//! HttpTransport against a local mock of the chat-bot backend.

use std::sync::Arc;
use std::time::Duration;

use chat_core::{
    ChatError, ChatTransport, ClientConfig, Controller, CreatedBy, HttpTransport, TransportError,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        request_timeout_secs: 5,
    }
}

#[tokio::test]
async fn posts_question_and_reads_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat_bot/"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "question": "hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "hi there" })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let reply = transport.send("hello").await.unwrap();
    assert_eq!(reply.response, "hi there");
}

#[tokio::test]
async fn question_is_sent_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat_bot/"))
        .and(body_json(json!({ "question": "  spaced out \n" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "" })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let reply = transport.send("  spaced out \n").await.unwrap();
    assert_eq!(reply.response, "");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat_bot/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let err = transport.send("ping").await.unwrap_err();
    match err {
        TransportError::Status { status, body } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_payload_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat_bot/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "wrong field" })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let err = transport.send("ping").await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
}

#[tokio::test]
async fn unreachable_backend_is_a_request_error() {
    let server = MockServer::start().await;
    let config = config_for(&server);
    drop(server);

    let transport = HttpTransport::new(&config).unwrap();
    let err = transport.send("ping").await.unwrap_err();
    assert!(matches!(err, TransportError::Request(_)));
}

#[tokio::test]
async fn controller_round_trip_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat_bot/"))
        .and(body_json(json!({ "question": "hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "hi there" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat_bot/"))
        .and(body_json(json!({ "question": "ping" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let transport = Arc::new(HttpTransport::new(&config).unwrap());
    let controller = Controller::new(transport, config.request_timeout());

    controller.ask("hello").await.unwrap();
    let err = controller.ask("ping").await.unwrap_err();
    assert!(matches!(err, ChatError::Transport(TransportError::Status { .. })));

    let state = controller.snapshot();
    assert!(!state.is_pending());
    let turns: Vec<_> = state
        .messages()
        .iter()
        .map(|m| (m.created_by, m.content.as_str()))
        .collect();
    assert_eq!(
        turns,
        vec![
            (CreatedBy::User, "hello"),
            (CreatedBy::ChatBot, "hi there"),
            (CreatedBy::User, "ping"),
        ]
    );
}

#[tokio::test]
async fn slow_backend_hits_the_deadline() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat_bot/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "too late" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let transport = Arc::new(HttpTransport::new(&config_for(&server)).unwrap());
    let controller = Controller::new(transport, Duration::from_millis(200));

    let err = controller.ask("hurry").await.unwrap_err();
    assert!(matches!(err, ChatError::Transport(TransportError::Timeout(_))));
    assert!(!controller.snapshot().is_pending());
    assert_eq!(controller.snapshot().messages().len(), 1);
}
