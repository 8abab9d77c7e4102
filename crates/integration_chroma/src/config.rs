//! Chroma client configuration

use serde::{Deserialize, Serialize};

/// Configuration for the Chroma vector store client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromaConfig {
    /// Base URL of the Chroma server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Tenant the collection lives under
    #[serde(default = "default_tenant")]
    pub tenant: String,

    /// Database the collection lives under
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection name, resolved to an id on first use
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tenant() -> String {
    "default_tenant".to_string()
}

fn default_database() -> String {
    "default_database".to_string()
}

fn default_collection() -> String {
    "knowledge_base".to_string()
}

const fn default_timeout_ms() -> u64 {
    30000 // 30 seconds
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            tenant: default_tenant(),
            database: default_database(),
            collection: default_collection(),
            timeout_ms: default_timeout_ms(),
        }
    }
}
