//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: Ollama generation,
//! Chroma-backed vector search, configuration loading, and telemetry.

pub mod adapters;
pub mod config;
pub mod telemetry;

pub use adapters::{ChromaSearchAdapter, MokaAnswerCache, OllamaGenerationAdapter};
pub use config::{AppConfig, CacheAppConfig, TelemetryAppConfig};
pub use telemetry::init_telemetry;
