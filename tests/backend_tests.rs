//! HTTP contract tests against a wiremock server

use serde_json::json;
use speech_studio::backend::{extract_reply, Backend, HttpBackend, QueryMode, QueryRequest};
use speech_studio::messages::{ChatSession, Role};
use speech_studio::StudioError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(format!("{}/query", server.uri()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_posts_mode_and_query_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "mode": 1, "query": "plan my day" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "response": "Here is your plan" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let value = backend
        .query(&QueryRequest::new(QueryMode::Multi, "plan my day"))
        .await
        .unwrap();

    assert_eq!(extract_reply(&value), "Here is your plan");
}

#[tokio::test]
async fn test_server_error_is_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "reply": "overloaded" })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend
        .query(&QueryRequest::new(QueryMode::Single, "hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, StudioError::BackendError(_)));
}

#[tokio::test]
async fn test_invalid_json_is_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .query(&QueryRequest::new(QueryMode::Single, "hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, StudioError::BackendError(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_backend_error() {
    // Nothing listens on port 9 (discard) in the test environment
    let backend = HttpBackend::new("http://127.0.0.1:9/query", Duration::from_secs(2)).unwrap();
    let err = backend
        .query(&QueryRequest::new(QueryMode::Single, "hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, StudioError::BackendError(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_session_round_trip_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({ "mode": 0, "query": "hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "hi there" })))
        .mount(&server)
        .await;

    let mut session = ChatSession::new(Arc::new(backend_for(&server)), tokio::runtime::Handle::current());
    session.submit("hello");

    let mut replies = Vec::new();
    for _ in 0..200 {
        replies.extend(session.poll());
        if !replies.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(replies.len(), 1);
    assert!(replies[0].ok);

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role(), Role::Bot);
    assert_eq!(messages[1].content(), "hi there");
    assert!(messages[1].metadata().latency_ms.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_session_error_reply_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut session = ChatSession::new(Arc::new(backend_for(&server)), tokio::runtime::Handle::current());
    session.submit("hello");

    for _ in 0..200 {
        if !session.poll().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content(), "❌ Backend error");
    assert!(messages[1].metadata().is_error);
}
