//! Wire-level tests for the OpenAI-compatible provider against a mock
//! chat-completions endpoint.

use serde_json::json;
use sidebyside_core::config::LlmConfig;
use sidebyside_core::error::LlmError;
use sidebyside_core::{ComparisonService, CompletionProvider, OpenAiCompatibleProvider, ServiceError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> LlmConfig {
    LlmConfig {
        api_key: Some("sk-test".into()),
        base_url: Some(format!("{}/v1", server.uri())),
        timeout_secs: Some(5),
        ..LlmConfig::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-4.1-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_request_shape_and_content_extraction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4.1-mini",
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"rows\": []}")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiCompatibleProvider::new(&config_for(&server)).unwrap();
    let content = provider.complete("hello").await.unwrap();
    assert_eq!(content, "{\"rows\": []}");
}

#[tokio::test]
async fn test_non_success_status_surfaces_as_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\": \"bad key\"}"))
        .mount(&server)
        .await;

    let provider = OpenAiCompatibleProvider::new(&config_for(&server)).unwrap();
    match provider.complete("hello").await.unwrap_err() {
        LlmError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("bad key"));
        }
        other => panic!("Expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let provider = OpenAiCompatibleProvider::new(&config_for(&server)).unwrap();
    assert!(matches!(
        provider.complete("hello").await.unwrap_err(),
        LlmError::ResponseParse { .. }
    ));
}

#[tokio::test]
async fn test_service_end_to_end_over_http() {
    let server = MockServer::start().await;
    let content = json!({
        "rows": [{"attribute": "Pros", "values": [["quiet"], ["cheap"]]}],
        "recap": {"suggestion": "No clear winner", "confidence": "high"}
    })
    .to_string();
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&content)))
        .expect(1)
        .mount(&server)
        .await;

    let service = ComparisonService::from_config(config_for(&server)).unwrap();
    assert!(service.provider_configured());
    let body = json!({"options": [{"name": "A", "text": "x"}, {"name": "B", "text": "y"}]});
    let html = service
        .compare(body.to_string().as_bytes())
        .await
        .unwrap();
    assert!(html.contains("<li>quiet</li>"));
    assert!(html.contains("confidence-low"));
}

#[tokio::test]
async fn test_service_reports_unreachable_upstream() {
    // Port 9 (discard) is not expected to accept connections.
    let config = LlmConfig {
        api_key: Some("sk-test".into()),
        base_url: Some("http://127.0.0.1:9/v1".into()),
        timeout_secs: Some(5),
        ..LlmConfig::default()
    };

    let service = ComparisonService::from_config(config).unwrap();
    let body = json!({"options": [{"text": "x"}, {"text": "y"}]});
    let err = service
        .compare(body.to_string().as_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Llm(_)));
    assert!(err.is_upstream_unavailable());
    assert_eq!(err.public_message(), "Error contacting the completion service.");
}
