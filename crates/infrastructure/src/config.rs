//! Application configuration
//!
//! Assembles the engine, inference, embedding, and store sections into one
//! structure loaded from an optional `config` file with `CRUCIBLE_`
//! environment overrides.

use ai_core::{EmbeddingConfig, InferenceConfig};
use application::EngineConfig;
use integration_chroma::ChromaConfig;
use serde::{Deserialize, Serialize};

/// Answer cache configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheAppConfig {
    /// Whether the answer cache is wired into the orchestrator
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of cached answers
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,

    /// Entry time-to-live in seconds
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_max_entries() -> u64 {
    1024
}

const fn default_ttl_seconds() -> u64 {
    3600 // 1 hour
}

impl Default for CacheAppConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_entries: default_max_entries(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryAppConfig {
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub json_output: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for TelemetryAppConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json_output: false,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Orchestration engine settings (panel, lead, budgets)
    #[serde(default)]
    pub engine: EngineConfig,

    /// Ollama chat endpoint settings
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Ollama embedding endpoint settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chroma vector store settings
    #[serde(default)]
    pub chroma: ChromaConfig,

    /// Answer cache settings
    #[serde(default)]
    pub cache: CacheAppConfig,

    /// Telemetry settings
    #[serde(default)]
    pub telemetry: TelemetryAppConfig,
}

impl AppConfig {
    /// Load configuration from environment and optional file
    ///
    /// Reads `config.toml` from the working directory when present, then
    /// applies environment overrides such as `CRUCIBLE_INFERENCE__BASE_URL`
    /// (double underscore between section and key).
    ///
    /// # Errors
    ///
    /// Returns an error when the file or environment contains values that
    /// do not deserialize into the expected sections.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a named file (without extension)
    ///
    /// # Errors
    ///
    /// Returns an error when the file or environment contains values that
    /// do not deserialize into the expected sections.
    pub fn load_from(name: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .add_source(
                config::Environment::with_prefix("CRUCIBLE")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
