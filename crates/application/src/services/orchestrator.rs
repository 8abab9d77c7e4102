//! Top-level run coordination
//!
//! Routes a query to Arena (paired benchmarking) or Swarm (deep reasoning)
//! mode, owns the run's trace recorder, and turns every outcome into either
//! a report with a complete trace or a failure with the partial trace.

use std::sync::Arc;
use std::time::Duration;

use domain::{EvidenceItem, EvidenceOrigin, ModelId, Query, RunId, RunMode, RunTrace};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, FailureStage, RunFailure};
use crate::ports::{AnswerCachePort, GenerationPort, VectorSearchPort};
use crate::prompts;
use crate::services::{ConsensusEngine, ModelInvoker, ReasoningPipeline, RetrievalAugmenter};
use crate::trace::TraceRecorder;

/// Side-by-side result of an Arena run
///
/// Both models answered the same retrieval-augmented prompt with no
/// cross-influence; scoring (Elo or human preference) happens outside the
/// engine, reading from the trace.
#[derive(Debug, Clone, Serialize)]
pub struct ArenaComparison {
    /// Left model of the configured pair
    pub left: ModelId,
    /// Right model of the configured pair
    pub right: ModelId,
    /// Left model's answer
    pub left_answer: String,
    /// Right model's answer
    pub right_answer: String,
}

/// A completed run: the answer plus its full audit trace
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Id shared with every trace entry of this run
    pub run_id: RunId,
    /// Final answer
    pub answer: String,
    /// Present for Arena-mode runs
    pub arena: Option<ArenaComparison>,
    /// Complete trace of all retrieval and model activity
    pub trace: RunTrace,
}

/// Coordinates retrieval, invocation, consensus, and reasoning for one query
pub struct Orchestrator {
    config: EngineConfig,
    search: Arc<dyn VectorSearchPort>,
    invoker: ModelInvoker,
    consensus: ConsensusEngine,
    pipeline: ReasoningPipeline,
    cache: Option<Arc<dyn AnswerCachePort>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Wire an orchestrator over the two external collaborators
    pub fn new(
        config: EngineConfig,
        generation: Arc<dyn GenerationPort>,
        search: Arc<dyn VectorSearchPort>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let invoker = ModelInvoker::new(generation);
        let augmenter =
            RetrievalAugmenter::new(search.clone(), invoker.clone(), config.drafter.clone());
        let consensus = ConsensusEngine::new(invoker.clone(), config.scoring);
        let pipeline = ReasoningPipeline::new(invoker.clone(), augmenter, &config);
        Ok(Self {
            config,
            search,
            invoker,
            consensus,
            pipeline,
            cache: None,
        })
    }

    /// Attach an answer cache, consulted before any Swarm-mode work
    ///
    /// Arena runs never use the cache: a benchmark that replays a stored
    /// answer would compare nothing.
    #[must_use]
    pub fn with_answer_cache(mut self, cache: Arc<dyn AnswerCachePort>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Execute a query to completion
    ///
    /// Success carries the full trace; failure names the stage and carries
    /// whatever partial trace was accumulated.
    #[instrument(skip(self, query), fields(query_id = %query.id, mode = %query.mode))]
    pub async fn run(&self, query: &Query) -> Result<RunReport, RunFailure> {
        let recorder = TraceRecorder::new(RunId::new());
        let run_id = recorder.run_id();
        match self.execute(query, &recorder).await {
            Ok((answer, arena)) => {
                info!(entries = recorder.len(), "Run completed");
                Ok(RunReport {
                    run_id,
                    answer,
                    arena,
                    trace: recorder.finish(),
                })
            },
            Err((stage, error)) => {
                warn!(%stage, %error, "Run failed");
                Err(RunFailure {
                    stage,
                    error,
                    trace: recorder.finish(),
                })
            },
        }
    }

    /// Execute with a run-level deadline
    ///
    /// On expiry all in-flight calls are dropped, not awaited; the recorder
    /// lives outside the timed future, so the truncated trace survives.
    pub async fn run_with_deadline(
        &self,
        query: &Query,
        deadline: Duration,
    ) -> Result<RunReport, RunFailure> {
        let recorder = TraceRecorder::new(RunId::new());
        let run_id = recorder.run_id();
        match tokio::time::timeout(deadline, self.execute(query, &recorder)).await {
            Ok(Ok((answer, arena))) => Ok(RunReport {
                run_id,
                answer,
                arena,
                trace: recorder.finish(),
            }),
            Ok(Err((stage, error))) => Err(RunFailure {
                stage,
                error,
                trace: recorder.finish(),
            }),
            Err(_) => {
                let timeout_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
                warn!(timeout_ms, "Run deadline exceeded, abandoning in-flight calls");
                recorder.annotate("deadline-exceeded", format!("run cut off after {timeout_ms}ms"));
                Err(RunFailure {
                    stage: FailureStage::Deadline,
                    error: EngineError::DeadlineExceeded { timeout_ms },
                    trace: recorder.finish(),
                })
            },
        }
    }

    /// Execute with the configured default deadline
    pub async fn run_with_default_deadline(&self, query: &Query) -> Result<RunReport, RunFailure> {
        self.run_with_deadline(query, Duration::from_millis(self.config.run_timeout_ms))
            .await
    }

    async fn execute(
        &self,
        query: &Query,
        recorder: &TraceRecorder,
    ) -> Result<(String, Option<ArenaComparison>), (FailureStage, EngineError)> {
        match query.mode {
            RunMode::Arena => {
                let comparison = self.run_arena(&query.text, recorder).await?;
                let answer = format!(
                    "[{}]\n{}\n\n[{}]\n{}",
                    comparison.left,
                    comparison.left_answer,
                    comparison.right,
                    comparison.right_answer
                );
                Ok((answer, Some(comparison)))
            },
            RunMode::Swarm => {
                let key = answer_cache_key(query);
                if let Some(answer) = self.cached_answer(&key).await {
                    info!("Answer served from cache");
                    recorder.annotate("cache-hit", "answer served from response cache");
                    return Ok((answer, None));
                }
                let answer = self.run_swarm(&query.text, recorder).await?;
                self.store_answer(&key, &answer).await;
                Ok((answer, None))
            },
        }
    }

    async fn cached_answer(&self, key: &str) -> Option<String> {
        match &self.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    async fn store_answer(&self, key: &str, answer: &str) {
        if let Some(cache) = &self.cache {
            cache.put(key, answer).await;
        }
    }

    /// Arena: one shared direct retrieval, then both models answer the
    /// identical prompt concurrently and independently
    async fn run_arena(
        &self,
        question: &str,
        recorder: &TraceRecorder,
    ) -> Result<ArenaComparison, (FailureStage, EngineError)> {
        let passages = self
            .search
            .search(question, self.config.evidence_k)
            .await
            .map_err(|fault| {
                let crate::ports::SearchFault::Unavailable { reason } = fault;
                (
                    FailureStage::Retrieval,
                    EngineError::RetrievalUnavailable(reason),
                )
            })?;
        let evidence: Vec<EvidenceItem> = passages
            .into_iter()
            .map(|p| EvidenceItem::new(p.source, p.text, p.score, EvidenceOrigin::Direct))
            .collect();
        for item in &evidence {
            recorder.record_evidence(item.clone());
        }

        let context = prompts::evidence_context(&evidence);
        let prompt = prompts::arena(question, &context);
        let left = &self.config.arena.left;
        let right = &self.config.arena.right;
        let (left_outcome, right_outcome) = tokio::join!(
            self.invoker.invoke(left, &prompt, recorder),
            self.invoker.invoke(right, &prompt, recorder),
        );
        let left_answer = arena_answer(left_outcome)?;
        let right_answer = arena_answer(right_outcome)?;
        Ok(ArenaComparison {
            left: left.clone(),
            right: right.clone(),
            left_answer,
            right_answer,
        })
    }

    /// Swarm: deep reasoning, optionally hardened by a consensus pass
    async fn run_swarm(
        &self,
        question: &str,
        recorder: &TraceRecorder,
    ) -> Result<String, (FailureStage, EngineError)> {
        let verified = self.pipeline.run(question, recorder).await?;
        if !self.config.high_stakes {
            return Ok(verified);
        }

        let review_prompt = prompts::high_stakes_review(question, &verified);
        self.consensus
            .consensus(
                &review_prompt,
                &self.config.panel,
                &self.config.lead,
                recorder,
            )
            .await
            .map_err(|error| {
                let stage = match &error {
                    EngineError::SynthesisFailed(_) => FailureStage::Synthesis,
                    _ => FailureStage::Consensus,
                };
                (stage, error)
            })
    }
}

/// Cache key over the run mode and query text, collision-safe separator
fn answer_cache_key(query: &Query) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(query.mode.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(query.text.as_bytes());
    format!("answer:{}", hasher.finalize().to_hex())
}

fn arena_answer(
    outcome: Result<domain::ModelResponse, EngineError>,
) -> Result<String, (FailureStage, EngineError)> {
    let response = outcome.map_err(|e| (FailureStage::Arena, e))?;
    Ok(response.text().unwrap_or_default().to_string())
}
