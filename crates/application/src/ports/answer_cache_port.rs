//! Answer cache port - Interface to the run-level response cache

use async_trait::async_trait;

/// Port for the answer cache consulted ahead of retrieval and inference
///
/// Keys are opaque hashes of the run mode and query text; values are final
/// answers. The cache is advisory: a miss or an absent cache runs the full
/// protocol, and storing never fails a run.
#[async_trait]
pub trait AnswerCachePort: Send + Sync {
    /// Look up the answer cached under a key
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a final answer under a key
    async fn put(&self, key: &str, answer: &str);
}
