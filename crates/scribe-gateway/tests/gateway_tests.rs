//! Integration tests for the gateway relay
//!
//! A wiremock server stands in for the Scribe backend; the gateway must
//! relay success bodies untouched and normalize every failure shape.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scribe_gateway::{AppState, GatewayConfig, create_router};

fn create_test_router(backend_url: String) -> axum::Router {
    let state = Arc::new(AppState {
        config: GatewayConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            backend_url,
        },
        client: reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap(),
    });
    create_router(state)
}

fn post_suggest(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/suggest")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_value(body: Body) -> serde_json::Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_success_body_relayed_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/suggest"))
        .and(body_json(serde_json::json!({"text": "hello"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"suggestion": "Hello there."})),
        )
        .mount(&mock_server)
        .await;

    let app = create_test_router(mock_server.uri());

    let response = app
        .oneshot(post_suggest(serde_json::json!({"text": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_value(response.into_body()).await;
    assert_eq!(json, serde_json::json!({"suggestion": "Hello there."}));
}

#[tokio::test]
async fn test_tone_forwarded_when_present() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/suggest"))
        .and(body_json(
            serde_json::json!({"text": "hello", "tone": "formal"}),
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"suggestion": "Greetings."})),
        )
        .mount(&mock_server)
        .await;

    let app = create_test_router(mock_server.uri());

    let response = app
        .oneshot(post_suggest(
            serde_json::json!({"text": "hello", "tone": "formal"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_backend_error_is_normalized() {
    let mock_server = MockServer::start().await;

    // Whatever detail the backend reports stays on the server side
    Mock::given(method("POST"))
        .and(path("/openai/suggest"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("Failed to get suggestion"),
        )
        .mount(&mock_server)
        .await;

    let app = create_test_router(mock_server.uri());

    let response = app
        .oneshot(post_suggest(serde_json::json!({"text": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_value(response.into_body()).await;
    assert_eq!(json, serde_json::json!({"error": "Backend failed"}));
}

#[tokio::test]
async fn test_backend_400_also_normalized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/suggest"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Missing text input"))
        .mount(&mock_server)
        .await;

    let app = create_test_router(mock_server.uri());

    let response = app
        .oneshot(post_suggest(serde_json::json!({"text": ""})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_value(response.into_body()).await;
    assert_eq!(json, serde_json::json!({"error": "Backend failed"}));
}

#[tokio::test]
async fn test_unreachable_backend_is_a_proxy_error() {
    // Nothing is listening on this port
    let app = create_test_router("http://127.0.0.1:9".to_string());

    let response = app
        .oneshot(post_suggest(serde_json::json!({"text": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_value(response.into_body()).await;
    assert_eq!(json, serde_json::json!({"error": "Proxy server error"}));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router("http://127.0.0.1:9".to_string());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_value(response.into_body()).await;
    assert_eq!(json["status"], "ok");
}
