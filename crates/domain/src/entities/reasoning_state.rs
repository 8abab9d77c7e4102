//! Deep reasoning state machine

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Stage of a deep reasoning run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningStage {
    /// Split the query into ordered sub-questions
    Decompose,
    /// Produce a draft hypothesis from evidence
    Hypothesize,
    /// Audit the hypothesis for weaknesses
    Critique,
    /// Check the hypothesis against evidence for consistency
    Verify,
    /// Terminal: hypothesis accepted as the final answer
    Done,
    /// Terminal: budget exhausted or a stage failed
    Failed,
}

impl ReasoningStage {
    /// Whether this stage ends the run
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for ReasoningStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Decompose => "decompose",
            Self::Hypothesize => "hypothesize",
            Self::Critique => "critique",
            Self::Verify => "verify",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Mutable record of one deep reasoning run
///
/// Owned exclusively by the pipeline instance executing the run. Stage order
/// never regresses except through the explicit retry transitions back to
/// `Hypothesize`; the retry count is a field so termination is guaranteed by
/// a budget check, not by recursion depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningState {
    /// Current stage
    stage: ReasoningStage,
    /// Ordered sub-questions from decomposition
    pub sub_questions: Vec<String>,
    /// Current draft hypothesis
    pub hypothesis: Option<String>,
    /// Critique and verification feedback accumulated across iterations
    pub critique_notes: Vec<String>,
    /// Terminal failure reason, if the run failed
    pub failure: Option<String>,
    /// Number of `Hypothesize` re-entries (retries, not the first entry)
    pub hypothesize_retries: u32,
}

impl ReasoningState {
    /// Start a new run in the `Decompose` stage
    pub fn new() -> Self {
        Self {
            stage: ReasoningStage::Decompose,
            sub_questions: Vec::new(),
            hypothesis: None,
            critique_notes: Vec::new(),
            failure: None,
            hypothesize_retries: 0,
        }
    }

    /// Current stage
    pub const fn stage(&self) -> ReasoningStage {
        self.stage
    }

    fn transition(&mut self, from: ReasoningStage, to: ReasoningStage) -> Result<(), DomainError> {
        if self.stage != from {
            return Err(DomainError::InvalidStageTransition {
                from: self.stage,
                to,
            });
        }
        self.stage = to;
        Ok(())
    }

    /// `Decompose` -> `Hypothesize` with the ordered sub-questions
    pub fn record_decomposition(
        &mut self,
        sub_questions: Vec<String>,
    ) -> Result<(), DomainError> {
        self.transition(ReasoningStage::Decompose, ReasoningStage::Hypothesize)?;
        self.sub_questions = sub_questions;
        Ok(())
    }

    /// `Hypothesize` -> `Critique` with the aggregated draft
    pub fn record_hypothesis(&mut self, hypothesis: impl Into<String>) -> Result<(), DomainError> {
        self.transition(ReasoningStage::Hypothesize, ReasoningStage::Critique)?;
        self.hypothesis = Some(hypothesis.into());
        Ok(())
    }

    /// `Critique` -> `Verify`: the critic found no issues
    pub fn pass_critique(&mut self) -> Result<(), DomainError> {
        self.transition(ReasoningStage::Critique, ReasoningStage::Verify)
    }

    /// `Critique` -> `Hypothesize` retry with the critique appended
    pub fn retry_from_critique(&mut self, note: impl Into<String>) -> Result<u32, DomainError> {
        self.transition(ReasoningStage::Critique, ReasoningStage::Hypothesize)?;
        self.critique_notes.push(note.into());
        self.hypothesize_retries += 1;
        Ok(self.hypothesize_retries)
    }

    /// `Verify` -> `Done`: the hypothesis is the final answer
    pub fn pass_verification(&mut self) -> Result<(), DomainError> {
        self.transition(ReasoningStage::Verify, ReasoningStage::Done)
    }

    /// `Verify` -> `Hypothesize` retry with the failure reason appended
    pub fn retry_from_verification(
        &mut self,
        reason: impl Into<String>,
    ) -> Result<u32, DomainError> {
        self.transition(ReasoningStage::Verify, ReasoningStage::Hypothesize)?;
        self.critique_notes.push(reason.into());
        self.hypothesize_retries += 1;
        Ok(self.hypothesize_retries)
    }

    /// Move any non-terminal stage to `Failed` with a reason
    pub fn fail(&mut self, reason: impl Into<String>) {
        if !self.stage.is_terminal() {
            self.stage = ReasoningStage::Failed;
            self.failure = Some(reason.into());
        }
    }
}

impl Default for ReasoningState {
    fn default() -> Self {
        Self::new()
    }
}
