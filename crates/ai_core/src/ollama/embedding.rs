//! Ollama embedding engine
//!
//! Text embeddings via Ollama's `/api/embed` endpoint, used behind the
//! vector-store boundary to embed query text before a semantic search.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::InferenceError;

/// Configuration for the embedding engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Embedding model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Number of embedding dimensions (for validation)
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

const fn default_timeout_ms() -> u64 {
    30000 // 30 seconds
}

const fn default_dimensions() -> usize {
    384 // nomic-embed-text dimensions
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_embedding_model(),
            timeout_ms: default_timeout_ms(),
            dimensions: default_dimensions(),
        }
    }
}

/// Ollama-compatible embedding engine
#[derive(Debug)]
pub struct OllamaEmbeddingEngine {
    client: Client,
    config: EmbeddingConfig,
}

impl OllamaEmbeddingEngine {
    /// Create a new embedding engine with the given configuration
    pub fn new(config: EmbeddingConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| InferenceError::ConnectionFailed(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            model = %config.model,
            dimensions = config.dimensions,
            "Initialized Ollama embedding engine"
        );

        Ok(Self { client, config })
    }

    /// Create with default configuration (nomic-embed-text)
    pub fn with_defaults() -> Result<Self, InferenceError> {
        Self::new(EmbeddingConfig::default())
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.config.base_url)
    }

    /// Configured model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Expected embedding dimensions
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// Generate an embedding for a single text
    #[instrument(skip(self, text), fields(model = %self.config.model, text_len = text.len()))]
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        let request = OllamaEmbedRequest {
            model: self.config.model.clone(),
            input: EmbedInput::Single(text.to_string()),
        };

        debug!("Sending embed request");

        let response = self
            .client
            .post(self.embed_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| InferenceError::from_reqwest(&e, self.config.timeout_ms))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Embed request failed");
            return Err(InferenceError::ServerError(format!(
                "Ollama returned {status}: {error_text}"
            )));
        }

        let result: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        // Newer servers answer with `embeddings`, older ones with `embedding`.
        let embedding = match result.embeddings {
            Some(mut embeddings) if !embeddings.is_empty() => embeddings.swap_remove(0),
            _ => result.embedding.ok_or_else(|| {
                InferenceError::InvalidResponse("No embedding in response".to_string())
            })?,
        };

        debug!(dimensions = embedding.len(), "Received embedding");

        Ok(embedding)
    }

    /// Generate embeddings for multiple texts in a batch
    #[instrument(skip(self, texts), fields(model = %self.config.model, batch_size = texts.len()))]
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, InferenceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = OllamaEmbedRequest {
            model: self.config.model.clone(),
            input: EmbedInput::Batch(texts.to_vec()),
        };

        let response = self
            .client
            .post(self.embed_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| InferenceError::from_reqwest(&e, self.config.timeout_ms))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Batch embed request failed");
            return Err(InferenceError::ServerError(format!(
                "Ollama returned {status}: {error_text}"
            )));
        }

        let result: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        let embeddings = result.embeddings.unwrap_or_default();

        if embeddings.len() != texts.len() {
            warn!(
                expected = texts.len(),
                got = embeddings.len(),
                "Mismatch in batch embedding count"
            );
        }

        Ok(embeddings)
    }
}

/// Ollama embed request format
#[derive(Debug, Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: EmbedInput,
}

/// Input for an embed request - single text or batch
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbedInput {
    Single(String),
    Batch(Vec<String>),
}

/// Ollama embed response format
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    /// Single embedding (older API format)
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    /// Multiple embeddings (newer API format)
    #[serde(default)]
    embeddings: Option<Vec<Vec<f32>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.model, "nomic-embed-text");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.base_url, "http://localhost:11434");
    }

    #[test]
    fn embed_url_construction() {
        let config = EmbeddingConfig {
            base_url: "http://example.com:8080".to_string(),
            ..Default::default()
        };
        let engine = OllamaEmbeddingEngine::new(config).unwrap();
        assert_eq!(engine.embed_url(), "http://example.com:8080/api/embed");
    }

    #[test]
    fn config_serialization_roundtrip() {
        let config = EmbeddingConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EmbeddingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.model, parsed.model);
        assert_eq!(config.dimensions, parsed.dimensions);
    }

    #[test]
    fn batch_input_serializes_as_array() {
        let request = OllamaEmbedRequest {
            model: "nomic-embed-text".to_string(),
            input: EmbedInput::Batch(vec!["a".to_string(), "b".to_string()]),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""input":["a","b"]"#));
    }
}
