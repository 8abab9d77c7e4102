//! AI Core - Local model serving clients
//!
//! HTTP clients for the Ollama-compatible serving endpoint: chat completion
//! for generation and `/api/embed` for embeddings. The engine talks to these
//! only through its ports; adapters live in the infrastructure layer.

pub mod config;
pub mod error;
pub mod ollama;

pub use config::InferenceConfig;
pub use error::InferenceError;
pub use ollama::{ChatReply, ChatRequest, EmbeddingConfig, OllamaClient, OllamaEmbeddingEngine};
