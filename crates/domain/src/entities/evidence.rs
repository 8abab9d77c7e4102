//! Retrieved evidence entity

use serde::{Deserialize, Serialize};

use crate::value_objects::SourceId;

/// Which retrieval pass produced an evidence item
///
/// Tags survive merging so the provenance of every passage in a final
/// answer is recoverable from the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceOrigin {
    /// Retrieved by the direct semantic query for the topic
    Direct,
    /// Retrieved by searching for the correction of a generated misconception
    MisconceptionCorrection,
}

/// A retrieved passage with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Chunk id in the vector store
    pub source: SourceId,
    /// Passage text
    pub text: String,
    /// Relevance score, higher is more relevant
    pub score: f32,
    /// Retrieval pass that produced this item
    pub origin: EvidenceOrigin,
}

impl EvidenceItem {
    /// Create an evidence item
    pub fn new(
        source: SourceId,
        text: impl Into<String>,
        score: f32,
        origin: EvidenceOrigin,
    ) -> Self {
        Self {
            source,
            text: text.into(),
            score,
            origin,
        }
    }
}
