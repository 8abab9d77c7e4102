//! Chroma v2 API payloads

use serde::{Deserialize, Serialize};

/// A nearest-neighbor hit with its distance converted to relevance
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaHit {
    /// Chunk id in the collection
    pub id: String,
    /// Stored document text
    pub document: String,
    /// Raw distance reported by the server (lower is closer)
    pub distance: f32,
}

impl ChromaHit {
    /// Relevance score in (0, 1], higher is more relevant
    ///
    /// `1 / (1 + distance)` maps a zero distance to 1.0 and decays
    /// monotonically; callers compare scores, never raw distances.
    #[must_use]
    pub fn relevance(&self) -> f32 {
        1.0 / (1.0 + self.distance.max(0.0))
    }
}

/// Get-or-create request for a named collection
#[derive(Debug, Serialize)]
pub(crate) struct CreateCollectionRequest {
    pub name: String,
    pub get_or_create: bool,
}

/// Collection resource as returned by the server
#[derive(Debug, Deserialize)]
pub(crate) struct CollectionResource {
    pub id: String,
}

/// Query request against a collection
#[derive(Debug, Serialize)]
pub(crate) struct QueryRequest {
    pub query_embeddings: Vec<Vec<f32>>,
    pub n_results: usize,
    pub include: Vec<String>,
}

/// Query response: parallel lists, one inner list per query embedding
#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    pub ids: Vec<Vec<String>>,
    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub distances: Option<Vec<Vec<f32>>>,
}

/// Ingestion request
#[derive(Debug, Serialize)]
pub(crate) struct AddRequest {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
}
