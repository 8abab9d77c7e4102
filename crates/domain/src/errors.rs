//! Domain-level errors

use thiserror::Error;

use crate::entities::ReasoningStage;

/// Errors that can occur in the domain layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Query text was empty or whitespace-only
    #[error("Query text must not be empty")]
    EmptyQuery,

    /// A reasoning state transition that the stage order forbids
    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidStageTransition {
        from: ReasoningStage,
        to: ReasoningStage,
    },

    /// A vote references a candidate response that is not in the trace
    #[error("Vote by {voter} references unknown candidate {candidate}")]
    VoteWithoutCandidate { voter: String, candidate: String },
}
