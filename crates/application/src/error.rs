//! Engine-level errors
//!
//! The failure taxonomy of the orchestration protocol. Degradable failures
//! (misconception generation) are absorbed by the retrieval augmenter and
//! annotated in the trace; everything else propagates as a failed run with
//! the partial trace attached.

use domain::{DomainError, ModelId, RunTrace};
use thiserror::Error;

/// Errors that can occur inside the orchestration engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The vector store is unreachable
    #[error("Vector store unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Trap generation failed; the augmenter degrades to direct-only retrieval
    #[error("Misconception generation failed: {0}")]
    MisconceptionGenerationFailed(String),

    /// A model call exceeded its deadline, including the single retry
    #[error("Model {model} timed out after {elapsed_ms}ms")]
    ModelTimeout { model: ModelId, elapsed_ms: u64 },

    /// The model is not loaded or the endpoint rejected the call
    #[error("Model {model} unavailable: {reason}")]
    ModelUnavailable { model: ModelId, reason: String },

    /// Fewer than a quorum of panel models produced an answer
    #[error("Consensus quorum failed: {succeeded} of {panel} panel models succeeded")]
    ConsensusQuorumFailed { succeeded: usize, panel: usize },

    /// The lead model's synthesis call failed; there is no fallback lead
    #[error("Lead synthesis failed: {0}")]
    SynthesisFailed(#[source] Box<EngineError>),

    /// The pipeline exhausted its hypothesize retry budget
    #[error("Iteration budget of {0} hypothesize retries exhausted")]
    MaxIterationsExceeded(u32),

    /// The whole run exceeded its deadline; in-flight calls were abandoned
    #[error("Run deadline of {timeout_ms}ms exceeded")]
    DeadlineExceeded { timeout_ms: u64 },

    /// The engine configuration is unusable
    #[error("Invalid engine configuration: {0}")]
    InvalidConfiguration(String),

    /// Domain-level invariant violation
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// The stage a failed run was in when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Retrieval ahead of generation (either mode)
    Retrieval,
    /// Arena-mode paired invocation
    Arena,
    /// Pipeline query decomposition
    Decompose,
    /// Pipeline hypothesis generation
    Hypothesize,
    /// Pipeline critique
    Critique,
    /// Pipeline verification
    Verify,
    /// Consensus panel dispatch or aggregation
    Consensus,
    /// Lead model synthesis
    Synthesis,
    /// Run-level deadline
    Deadline,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Retrieval => "retrieval",
            Self::Arena => "arena",
            Self::Decompose => "decompose",
            Self::Hypothesize => "hypothesize",
            Self::Critique => "critique",
            Self::Verify => "verify",
            Self::Consensus => "consensus",
            Self::Synthesis => "synthesis",
            Self::Deadline => "deadline",
        };
        write!(f, "{s}")
    }
}

/// A failed run: the stage, the originating error, and the partial trace
///
/// The trace is whatever was accumulated up to the failure point - never
/// silently dropped.
#[derive(Debug)]
pub struct RunFailure {
    /// Stage the run failed in
    pub stage: FailureStage,
    /// The originating error, kind preserved
    pub error: EngineError,
    /// Partial trace accumulated before the failure
    pub trace: RunTrace,
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run failed during {}: {}", self.stage, self.error)
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
