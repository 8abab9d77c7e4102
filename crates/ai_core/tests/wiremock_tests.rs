//! Integration tests for the Ollama clients using WireMock
//!
//! These tests mock the Ollama HTTP API to verify client behavior without
//! requiring an actual server.

use ai_core::{
    ChatRequest, EmbeddingConfig, InferenceConfig, InferenceError, OllamaClient,
    OllamaEmbeddingEngine,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn inference_config_for_mock(base_url: &str) -> InferenceConfig {
    InferenceConfig {
        base_url: base_url.to_string(),
        temperature: 0.7,
        max_tokens: 100,
        top_p: 0.9,
        timeout_ms: 5000,
    }
}

fn embedding_config_for_mock(base_url: &str) -> EmbeddingConfig {
    EmbeddingConfig {
        base_url: base_url.to_string(),
        model: "nomic-embed-text".to_string(),
        timeout_ms: 5000,
        dimensions: 384,
    }
}

/// Sample Ollama chat success response
fn chat_success_response() -> serde_json::Value {
    serde_json::json!({
        "model": "test-model",
        "message": {
            "role": "assistant",
            "content": "Axial tilt causes seasons."
        },
        "done": true,
        "prompt_eval_count": 10,
        "eval_count": 15
    })
}

fn models_list_response() -> serde_json::Value {
    serde_json::json!({
        "models": [
            {"name": "gemma-3-4b"},
            {"name": "qwen3"},
            {"name": "nomic-embed-text"}
        ]
    })
}

#[allow(clippy::cast_precision_loss)]
fn embed_single_response() -> serde_json::Value {
    let embedding: Vec<f32> = (0..384).map(|i| (i as f32) / 384.0).collect();
    serde_json::json!({
        "embeddings": [embedding]
    })
}

mod chat_tests {
    use super::*;

    #[tokio::test]
    async fn chat_success_parses_content_and_usage() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_success_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OllamaClient::new(inference_config_for_mock(&mock_server.uri())).unwrap();
        let reply = client
            .chat(&ChatRequest::new("test-model", "What causes seasons?"))
            .await
            .unwrap();

        assert_eq!(reply.model, "test-model");
        assert!(reply.content.contains("Axial tilt"));
        let usage = reply.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 10);
        assert_eq!(usage.completion_tokens, 15);
        assert_eq!(usage.total_tokens, 25);
    }

    #[tokio::test]
    async fn chat_sends_sampling_options() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "stream": false,
                "options": {"temperature": 0.9, "num_predict": 50}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_success_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OllamaClient::new(inference_config_for_mock(&mock_server.uri())).unwrap();
        let mut request = ChatRequest::new("test-model", "hello");
        request.temperature = Some(0.9);
        request.max_tokens = Some(50);

        client.chat(&request).await.unwrap();
    }

    #[tokio::test]
    async fn chat_falls_back_to_configured_sampling() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "options": {"temperature": 0.7, "num_predict": 100, "top_p": 0.9}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_success_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OllamaClient::new(inference_config_for_mock(&mock_server.uri())).unwrap();
        client
            .chat(&ChatRequest::new("test-model", "hello"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_model_maps_to_model_not_available() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&mock_server)
            .await;

        let client = OllamaClient::new(inference_config_for_mock(&mock_server.uri())).unwrap();
        let err = client
            .chat(&ChatRequest::new("ghost-model", "hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, InferenceError::ModelNotAvailable(model) if model == "ghost-model"));
    }

    #[tokio::test]
    async fn server_error_surfaces_status_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("out of memory"))
            .mount(&mock_server)
            .await;

        let client = OllamaClient::new(inference_config_for_mock(&mock_server.uri())).unwrap();
        let err = client
            .chat(&ChatRequest::new("test-model", "hello"))
            .await
            .unwrap_err();

        match err {
            InferenceError::ServerError(message) => {
                assert!(message.contains("500"));
                assert!(message.contains("out of memory"));
            },
            other => panic!("expected ServerError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = OllamaClient::new(inference_config_for_mock(&mock_server.uri())).unwrap();
        let err = client
            .chat(&ChatRequest::new("test-model", "hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, InferenceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn list_models_returns_names() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(models_list_response()))
            .mount(&mock_server)
            .await;

        let client = OllamaClient::new(inference_config_for_mock(&mock_server.uri())).unwrap();
        let models = client.list_models().await.unwrap();

        assert_eq!(models, vec!["gemma-3-4b", "qwen3", "nomic-embed-text"]);
    }

    #[tokio::test]
    async fn health_check_true_when_tags_answers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(models_list_response()))
            .mount(&mock_server)
            .await;

        let client = OllamaClient::new(inference_config_for_mock(&mock_server.uri())).unwrap();
        assert!(client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn health_check_false_when_unreachable() {
        // Nothing listens on this port.
        let config = inference_config_for_mock("http://127.0.0.1:1");
        let client = OllamaClient::new(config).unwrap();
        assert!(!client.health_check().await.unwrap());
    }
}

mod embedding_tests {
    use super::*;

    #[tokio::test]
    async fn embed_single_returns_vector() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(embed_single_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let engine =
            OllamaEmbeddingEngine::new(embedding_config_for_mock(&mock_server.uri())).unwrap();
        let embedding = engine.embed("What causes seasons?").await.unwrap();

        assert_eq!(embedding.len(), 384);
    }

    #[tokio::test]
    async fn embed_accepts_legacy_single_field() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": [0.1, 0.2, 0.3]
            })))
            .mount(&mock_server)
            .await;

        let engine =
            OllamaEmbeddingEngine::new(embedding_config_for_mock(&mock_server.uri())).unwrap();
        let embedding = engine.embed("hello").await.unwrap();

        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn embed_batch_returns_one_vector_per_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.1, 0.2], [0.3, 0.4]]
            })))
            .mount(&mock_server)
            .await;

        let engine =
            OllamaEmbeddingEngine::new(embedding_config_for_mock(&mock_server.uri())).unwrap();
        let embeddings = engine
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(embeddings.len(), 2);
    }

    #[tokio::test]
    async fn embed_batch_empty_input_skips_the_request() {
        let engine =
            OllamaEmbeddingEngine::new(embedding_config_for_mock("http://127.0.0.1:1")).unwrap();
        let embeddings = engine.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[tokio::test]
    async fn missing_embedding_is_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let engine =
            OllamaEmbeddingEngine::new(embedding_config_for_mock(&mock_server.uri())).unwrap();
        let err = engine.embed("hello").await.unwrap_err();

        assert!(matches!(err, InferenceError::InvalidResponse(_)));
    }
}
