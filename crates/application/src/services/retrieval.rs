//! Misconception-trap retrieval augmentation
//!
//! A direct semantic query alone tends to retrieve passages that agree with
//! the question's framing. The augmenter additionally generates a plausible
//! but false claim about the topic and searches for its correction, pulling
//! in passages that refute the likely misconception.

use std::fmt;
use std::sync::Arc;

use domain::{EvidenceItem, EvidenceOrigin, ModelId, SourceId};
use tracing::{debug, instrument, warn};

use crate::error::EngineError;
use crate::ports::{GenerationOptions, ScoredPassage, SearchFault, VectorSearchPort};
use crate::prompts;
use crate::services::ModelInvoker;
use crate::trace::TraceRecorder;

/// Sampling options for the trap generation: high temperature, short reply
const TRAP_OPTIONS: GenerationOptions = GenerationOptions::defaults()
    .with_temperature(0.9)
    .with_max_tokens(100);

/// Evidence retrieval with misconception-trap augmentation
#[derive(Clone)]
pub struct RetrievalAugmenter {
    search: Arc<dyn VectorSearchPort>,
    invoker: ModelInvoker,
    trap_model: ModelId,
}

impl fmt::Debug for RetrievalAugmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievalAugmenter")
            .field("trap_model", &self.trap_model)
            .finish_non_exhaustive()
    }
}

impl RetrievalAugmenter {
    /// Create an augmenter over a vector store and the trap-generation model
    pub fn new(search: Arc<dyn VectorSearchPort>, invoker: ModelInvoker, trap_model: ModelId) -> Self {
        Self {
            search,
            invoker,
            trap_model,
        }
    }

    /// Retrieve up to `k` merged evidence items for a topic
    ///
    /// The direct query and the trap generation run concurrently. A failed
    /// trap generation degrades to direct-only retrieval with a trace
    /// annotation; an unreachable vector store is fatal.
    #[instrument(skip(self, recorder), fields(k))]
    pub async fn retrieve(
        &self,
        topic: &str,
        k: usize,
        recorder: &TraceRecorder,
    ) -> Result<Vec<EvidenceItem>, EngineError> {
        let trap_prompt = prompts::misconception_trap(topic);
        let (direct, trap) = tokio::join!(
            self.search.search(topic, k),
            self.invoker
                .invoke_with_options(&self.trap_model, &trap_prompt, &TRAP_OPTIONS, recorder),
        );

        let direct = tag(direct.map_err(store_unreachable)?, EvidenceOrigin::Direct);

        let correction = match trap {
            Ok(response) => match response.text() {
                Some(trap_text) => {
                    debug!(trap_len = trap_text.len(), "Searching for trap correction");
                    let hits = self
                        .search
                        .search(trap_text, k)
                        .await
                        .map_err(store_unreachable)?;
                    tag(hits, EvidenceOrigin::MisconceptionCorrection)
                },
                None => Vec::new(),
            },
            Err(error) => {
                let error = EngineError::MisconceptionGenerationFailed(error.to_string());
                warn!(%error, "Degrading to direct-only retrieval");
                recorder.annotate("retrieval-degraded", error.to_string());
                Vec::new()
            },
        };

        let merged = merge_evidence(direct, correction, k);
        for item in &merged {
            recorder.record_evidence(item.clone());
        }
        Ok(merged)
    }
}

fn store_unreachable(fault: SearchFault) -> EngineError {
    let SearchFault::Unavailable { reason } = fault;
    EngineError::RetrievalUnavailable(reason)
}

fn tag(passages: Vec<ScoredPassage>, origin: EvidenceOrigin) -> Vec<EvidenceItem> {
    passages
        .into_iter()
        .map(|p| EvidenceItem::new(p.source, p.text, p.score, origin))
        .collect()
}

/// Merge two rank-ordered evidence lists into one
///
/// Items interleave by descending score with direct-origin items winning
/// ties; relative rank within each input list is preserved. The first
/// occurrence of a source id wins and later duplicates are dropped. The
/// result is truncated to `k`.
pub(crate) fn merge_evidence(
    direct: Vec<EvidenceItem>,
    correction: Vec<EvidenceItem>,
    k: usize,
) -> Vec<EvidenceItem> {
    let mut merged: Vec<EvidenceItem> = Vec::with_capacity(direct.len() + correction.len());
    let mut seen: Vec<SourceId> = Vec::new();
    let mut direct = direct.into_iter().peekable();
    let mut correction = correction.into_iter().peekable();

    loop {
        let take_direct = match (direct.peek(), correction.peek()) {
            (Some(d), Some(c)) => d.score >= c.score,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let item = if take_direct {
            direct.next()
        } else {
            correction.next()
        };
        if let Some(item) = item {
            if !seen.contains(&item.source) {
                seen.push(item.source.clone());
                merged.push(item);
            }
        }
    }

    merged.truncate(k);
    merged
}
