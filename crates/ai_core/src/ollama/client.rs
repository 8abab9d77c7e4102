//! Ollama chat-completion client

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::InferenceConfig;
use crate::error::InferenceError;

/// One chat-completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model to invoke
    pub model: String,
    /// User prompt; callers thread any prior context in here
    pub prompt: String,
    /// Sampling temperature override
    pub temperature: Option<f32>,
    /// Completion length limit override
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Request with endpoint-default sampling
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Token accounting reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A completed chat reply
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Generated text
    pub content: String,
    /// Model that produced it
    pub model: String,
    /// Token usage, when the server reports it
    pub usage: Option<TokenUsage>,
}

/// Client for an Ollama-compatible chat API
#[derive(Debug)]
pub struct OllamaClient {
    client: Client,
    config: InferenceConfig,
}

impl OllamaClient {
    /// Create a new client
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| InferenceError::ConnectionFailed(e.to_string()))?;

        info!(base_url = %config.base_url, "Initialized Ollama client");

        Ok(Self { client, config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self, InferenceError> {
        Self::new(InferenceConfig::default())
    }

    /// Configured request timeout in milliseconds
    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.config.timeout_ms
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/api/{}",
            self.config.base_url,
            endpoint.trim_start_matches('/')
        )
    }

    /// Request one non-streaming chat completion
    #[instrument(skip(self, request), fields(model = %request.model, prompt_len = request.prompt.len()))]
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, InferenceError> {
        let body = OllamaChatRequest {
            model: request.model.clone(),
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            stream: false,
            options: Some(OllamaOptions {
                temperature: request.temperature.or(Some(self.config.temperature)),
                num_predict: request.max_tokens.or(Some(self.config.max_tokens)),
                top_p: Some(self.config.top_p),
            }),
        };

        debug!("Sending chat request");

        let response = self
            .client
            .post(self.api_url("chat"))
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::from_reqwest(&e, self.config.timeout_ms))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(InferenceError::ModelNotAvailable(request.model.clone()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Chat request failed");
            return Err(InferenceError::ServerError(format!("Status {status}: {body}")));
        }

        let reply: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        let usage = match (reply.prompt_eval_count, reply.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };

        debug!(tokens = ?usage, "Chat completed");

        Ok(ChatReply {
            content: reply.message.content,
            model: reply.model,
            usage,
        })
    }

    /// Whether the server answers at all
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<bool, InferenceError> {
        let response = self
            .client
            .get(self.api_url("tags"))
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) if e.is_timeout() || e.is_connect() => Ok(false),
            Err(e) => Err(InferenceError::RequestFailed(e.to_string())),
        }
    }

    /// Names of the models the server has loaded
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        let response = self
            .client
            .get(self.api_url("tags"))
            .send()
            .await
            .map_err(|e| InferenceError::from_reqwest(&e, self.config.timeout_ms))?;

        if !response.status().is_success() {
            return Err(InferenceError::ServerError(response.status().to_string()));
        }

        let models: OllamaModelsResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        Ok(models.models.into_iter().map(|m| m.name).collect())
    }
}

/// Ollama-format chat request
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// Ollama-format chat response
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    message: OllamaResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_urls() {
        let client = OllamaClient::with_defaults().unwrap();
        assert_eq!(client.api_url("chat"), "http://localhost:11434/api/chat");
        assert_eq!(client.api_url("/tags"), "http://localhost:11434/api/tags");
    }

    #[test]
    fn chat_request_defaults_to_no_overrides() {
        let request = ChatRequest::new("gemma-3-4b", "hello");
        assert!(request.temperature.is_none());
        assert!(request.max_tokens.is_none());
    }

    #[test]
    fn options_skip_unset_fields() {
        let options = OllamaOptions {
            temperature: Some(0.9),
            num_predict: None,
            top_p: None,
        };
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"temperature":0.9}"#);
    }
}
