//! Ollama inference against a mocked Ollama server.

#![cfg(feature = "ollama")]

use mindful::llm::InferenceService;
use mindful::llm::ollama::OllamaInference;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_chat_response(content: &str) -> serde_json::Value {
    json!({
        "model": "llama3.2",
        "created_at": "2024-01-01T00:00:00Z",
        "message": {
            "role": "assistant",
            "content": content
        },
        "done": true
    })
}

#[tokio::test]
async fn test_invoke_returns_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(mock_chat_response("That sounds like a lot to carry.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let inference = OllamaInference::new(server.uri(), "llama3.2".to_string())
        .await
        .unwrap();
    let reply = inference.invoke("I have three exams tomorrow").await.unwrap();

    assert_eq!(reply, "That sounds like a lot to carry.");
    assert_eq!(inference.model_name(), "llama3.2");
}

#[tokio::test]
async fn test_server_error_is_inference_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "model not loaded"})))
        .mount(&server)
        .await;

    let inference = OllamaInference::new(server.uri(), "llama3.2".to_string())
        .await
        .unwrap();
    let err = inference.invoke("hello").await.unwrap_err();
    assert!(matches!(err, mindful::types::AppError::Inference(_)));
}
