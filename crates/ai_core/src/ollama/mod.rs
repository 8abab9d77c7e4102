//! Clients for an Ollama-compatible server
//!
//! Chat completion via `/api/chat`, embeddings via `/api/embed`, model
//! listing via `/api/tags`.

mod client;
mod embedding;

pub use client::{ChatReply, ChatRequest, OllamaClient, TokenUsage};
pub use embedding::{EmbeddingConfig, OllamaEmbeddingEngine};
