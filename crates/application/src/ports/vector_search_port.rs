//! Vector search port - Interface to the vector store

use async_trait::async_trait;
use domain::SourceId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A passage returned by a semantic query, with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    /// Chunk id in the store
    pub source: SourceId,
    /// Passage text
    pub text: String,
    /// Relevance score, higher is more relevant
    pub score: f32,
}

/// Failure modes of the vector store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchFault {
    /// The store is unreachable or rejected the query
    #[error("vector store unreachable: {reason}")]
    Unavailable { reason: String },
}

/// Port for semantic search against the vector store
///
/// Embedding of the query text happens behind this boundary; the engine
/// never calls the embedding provider directly.
#[async_trait]
pub trait VectorSearchPort: Send + Sync {
    /// Return the `k` most relevant passages for a query text
    async fn search(&self, text: &str, k: usize) -> Result<Vec<ScoredPassage>, SearchFault>;
}
