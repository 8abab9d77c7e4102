//! Generation port - Interface to the model-serving endpoint

use async_trait::async_trait;
use domain::ModelId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options for one generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Token/length limit for the completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationOptions {
    /// Endpoint defaults, no overrides
    pub const fn defaults() -> Self {
        Self {
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set the sampling temperature
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion length limit
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::defaults()
    }
}

/// A completed generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    /// Generated text
    pub text: String,
}

/// Failure modes of the model-serving endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFault {
    /// The call exceeded the per-call deadline
    #[error("generation timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
    /// The model is not loaded, or the endpoint refused the call
    /// (backpressure surfaces here too)
    #[error("model unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Port for the model-serving endpoint
///
/// Each call is independent and stateless; callers thread prior turns into
/// the prompt explicitly when context is needed.
#[async_trait]
pub trait GenerationPort: Send + Sync {
    /// Request a completion from a named model
    async fn generate(
        &self,
        model: &ModelId,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Generation, GenerationFault>;
}
