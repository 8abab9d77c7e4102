//! Ollama generation adapter - Implements GenerationPort using ai_core
//!
//! Works with any Ollama-compatible backend serving the `/api/chat`
//! endpoint.

use ai_core::{ChatRequest, InferenceConfig, InferenceError, OllamaClient};
use application::ports::{Generation, GenerationFault, GenerationOptions, GenerationPort};
use async_trait::async_trait;
use domain::ModelId;
use tracing::{debug, instrument};

/// Adapter for Ollama-compatible model servers
#[derive(Debug)]
pub struct OllamaGenerationAdapter {
    client: OllamaClient,
}

impl OllamaGenerationAdapter {
    /// Create a new adapter with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        let client = OllamaClient::new(config)?;
        Ok(Self { client })
    }

    /// Create an adapter targeting the default local server
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self, InferenceError> {
        Ok(Self {
            client: OllamaClient::with_defaults()?,
        })
    }

    /// List model names known to the server
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable.
    pub async fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        self.client.list_models().await
    }

    /// Check whether the server is reachable
    ///
    /// # Errors
    ///
    /// Returns an error for client problems; an unreachable server yields
    /// `Ok(false)`.
    pub async fn health_check(&self) -> Result<bool, InferenceError> {
        self.client.health_check().await
    }

    fn map_error(&self, e: InferenceError) -> GenerationFault {
        match e {
            InferenceError::Timeout(_) => GenerationFault::Timeout {
                elapsed_ms: self.client.timeout_ms(),
            },
            other => GenerationFault::Unavailable {
                reason: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl GenerationPort for OllamaGenerationAdapter {
    #[instrument(skip(self, prompt), fields(model = %model, prompt_len = prompt.len()))]
    async fn generate(
        &self,
        model: &ModelId,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Generation, GenerationFault> {
        let mut request = ChatRequest::new(model.as_str(), prompt);
        request.temperature = options.temperature;
        request.max_tokens = options.max_tokens;

        let reply = self
            .client
            .chat(&request)
            .await
            .map_err(|e| self.map_error(e))?;

        debug!(reply_len = reply.content.len(), "Generation completed");
        Ok(Generation {
            text: reply.content,
        })
    }
}
