//! Integration tests for the OpenAI-compatible upstream client
//!
//! Uses wiremock to stand in for the provider: completion parsing, error
//! surfacing, credential handling, and SSE stream decoding.

use futures::StreamExt;
use std::env;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scribe_server::config::UpstreamConfig;
use scribe_server::upstream::{ChatMessage, CompletionBackend, CompletionOptions, OpenAiClient};

fn create_test_config(api_url: String, api_key_env: &str) -> UpstreamConfig {
    UpstreamConfig {
        api_url,
        api_key_env: api_key_env.to_string(),
        model: "gpt-4o-mini".to_string(),
        timeout_secs: 30,
        max_tokens: 700,
        temperature: 0.7,
    }
}

#[tokio::test]
async fn test_client_new_missing_api_key() {
    unsafe { env::remove_var("SCRIBE_TEST_MISSING_KEY") };

    let config = create_test_config(
        "https://api.example.com/v1".to_string(),
        "SCRIBE_TEST_MISSING_KEY",
    );
    let result = OpenAiClient::new(&config);

    assert!(result.is_err());
    let err = result.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(err.contains("SCRIBE_TEST_MISSING_KEY"));
}

#[tokio::test]
async fn test_complete_returns_message_content() {
    let mock_server = MockServer::start().await;

    let response_body = serde_json::json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": "A clearer version."
            }
        }]
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
        .mount(&mock_server)
        .await;

    unsafe { env::set_var("SCRIBE_TEST_KEY_COMPLETE", "test-key") };
    let config = create_test_config(mock_server.uri(), "SCRIBE_TEST_KEY_COMPLETE");
    let client = OpenAiClient::new(&config).unwrap();

    let result = client
        .complete("Rewrite this", &CompletionOptions::default())
        .await;
    assert_eq!(result.unwrap(), "A clearer version.");
}

#[tokio::test]
async fn test_complete_json_returns_raw_text() {
    let mock_server = MockServer::start().await;

    let response_body = serde_json::json!({
        "choices": [{
            "message": {
                "content": r#"[{"id":"1","type":"clarity"}]"#
            }
        }]
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
        .mount(&mock_server)
        .await;

    unsafe { env::set_var("SCRIBE_TEST_KEY_JSON", "test-key") };
    let config = create_test_config(mock_server.uri(), "SCRIBE_TEST_KEY_JSON");
    let client = OpenAiClient::new(&config).unwrap();

    let result = client
        .complete_json("Analyze this", &CompletionOptions::default())
        .await;
    // The raw text comes back unparsed; validation belongs to the caller
    assert_eq!(result.unwrap(), r#"[{"id":"1","type":"clarity"}]"#);
}

#[tokio::test]
async fn test_complete_api_error_surfaces_status_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    unsafe { env::set_var("SCRIBE_TEST_KEY_ERR", "test-key") };
    let config = create_test_config(mock_server.uri(), "SCRIBE_TEST_KEY_ERR");
    let client = OpenAiClient::new(&config).unwrap();

    let result = client.complete("text", &CompletionOptions::default()).await;
    assert!(result.is_err());
    let err = result.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(err.contains("500"));
    assert!(err.contains("Internal Server Error"));
}

#[tokio::test]
async fn test_complete_empty_choices_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&mock_server)
        .await;

    unsafe { env::set_var("SCRIBE_TEST_KEY_EMPTY", "test-key") };
    let config = create_test_config(mock_server.uri(), "SCRIBE_TEST_KEY_EMPTY");
    let client = OpenAiClient::new(&config).unwrap();

    let result = client.complete("text", &CompletionOptions::default()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_stream_complete_decodes_sse_fragments() {
    let mock_server = MockServer::start().await;

    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\n",
        "data: [DONE]\n\n",
    );

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse.as_bytes().to_vec(), "text/event-stream"),
        )
        .mount(&mock_server)
        .await;

    unsafe { env::set_var("SCRIBE_TEST_KEY_STREAM", "test-key") };
    let config = create_test_config(mock_server.uri(), "SCRIBE_TEST_KEY_STREAM");
    let client = OpenAiClient::new(&config).unwrap();

    let messages = [ChatMessage::user("critique this")];
    let stream = client
        .stream_complete(&messages, &CompletionOptions::default())
        .await
        .unwrap();

    let fragments: Vec<String> = stream.map(|r| r.unwrap()).collect().await;
    assert_eq!(fragments, vec!["Hel", "lo", " world"]);
    assert_eq!(fragments.concat(), "Hello world");
}

#[tokio::test]
async fn test_stream_complete_error_status_fails_before_streaming() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&mock_server)
        .await;

    unsafe { env::set_var("SCRIBE_TEST_KEY_STREAM_ERR", "test-key") };
    let config = create_test_config(mock_server.uri(), "SCRIBE_TEST_KEY_STREAM_ERR");
    let client = OpenAiClient::new(&config).unwrap();

    let messages = [ChatMessage::user("critique this")];
    let result = client
        .stream_complete(&messages, &CompletionOptions::default())
        .await;

    // The status is checked before any fragment is produced
    assert!(result.is_err());
    let err = result.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(err.contains("429"));
}

#[tokio::test]
async fn test_network_failure_is_an_upstream_error() {
    // Nothing is listening on this port
    unsafe { env::set_var("SCRIBE_TEST_KEY_NET", "test-key") };
    let config = create_test_config(
        "http://127.0.0.1:9".to_string(),
        "SCRIBE_TEST_KEY_NET",
    );
    let client = OpenAiClient::new(&config).unwrap();

    let result = client.complete("text", &CompletionOptions::default()).await;
    assert!(result.is_err());
}
