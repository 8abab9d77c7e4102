//! Chroma search adapter - Implements VectorSearchPort
//!
//! Embeds the query text through Ollama, then runs a nearest-neighbor
//! query against the Chroma collection. Distances never leave this
//! adapter; callers see relevance scores only.

use ai_core::OllamaEmbeddingEngine;
use application::ports::{ScoredPassage, SearchFault, VectorSearchPort};
use async_trait::async_trait;
use domain::SourceId;
use integration_chroma::ChromaClient;
use tracing::{debug, instrument};

/// Adapter combining the embedding engine and the Chroma store
#[derive(Debug)]
pub struct ChromaSearchAdapter {
    embedder: OllamaEmbeddingEngine,
    store: ChromaClient,
}

impl ChromaSearchAdapter {
    /// Create a new adapter from an embedding engine and a store client
    pub const fn new(embedder: OllamaEmbeddingEngine, store: ChromaClient) -> Self {
        Self { embedder, store }
    }

    /// Check whether the Chroma store is reachable
    pub async fn health_check(&self) -> bool {
        self.store.health_check().await.unwrap_or(false)
    }
}

#[async_trait]
impl VectorSearchPort for ChromaSearchAdapter {
    #[instrument(skip(self, text), fields(text_len = text.len(), k = k))]
    async fn search(&self, text: &str, k: usize) -> Result<Vec<ScoredPassage>, SearchFault> {
        let embedding = self.embedder.embed(text).await.map_err(|e| {
            SearchFault::Unavailable {
                reason: format!("embedding failed: {e}"),
            }
        })?;

        let hits =
            self.store
                .query(embedding, k)
                .await
                .map_err(|e| SearchFault::Unavailable {
                    reason: e.to_string(),
                })?;

        let passages: Vec<ScoredPassage> = hits
            .into_iter()
            .map(|hit| ScoredPassage {
                score: hit.relevance(),
                source: SourceId::new(hit.id),
                text: hit.document,
            })
            .collect();

        debug!(passages = passages.len(), "Vector search completed");
        Ok(passages)
    }
}
