//! Engine configuration
//!
//! One explicitly passed configuration object - which models are loaded,
//! which panel votes, which budgets apply - so runs are independently
//! testable with mock panels instead of ambient global state.

use domain::ModelId;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// How the consensus engine weighs candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringMode {
    /// Forward raw candidate answers to the lead without voting
    #[default]
    None,
    /// Each panel model scores every other candidate (self-exclusion)
    PeerReview,
}

/// The two models compared in Arena mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaPair {
    /// Model shown on the left
    pub left: ModelId,
    /// Model shown on the right
    pub right: ModelId,
}

impl Default for ArenaPair {
    fn default() -> Self {
        Self {
            left: ModelId::new("gemma-3-4b"),
            right: ModelId::new("qwen3"),
        }
    }
}

/// Configuration of the orchestration engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fixed set of models polled by the consensus engine
    #[serde(default = "default_panel")]
    pub panel: Vec<ModelId>,

    /// Model that synthesizes panel outputs into one answer
    #[serde(default = "default_lead")]
    pub lead: ModelId,

    /// Arena-mode model pair
    #[serde(default)]
    pub arena: ArenaPair,

    /// Model driving decomposition and hypothesis drafting
    #[serde(default = "default_drafter")]
    pub drafter: ModelId,

    /// Distinct critic/verifier model; falls back to the drafter
    #[serde(default)]
    pub critic: Option<ModelId>,

    /// Whether panel models vote on each other's candidates
    #[serde(default)]
    pub scoring: ScoringMode,

    /// Evidence items requested per retrieval pass
    #[serde(default = "default_evidence_k")]
    pub evidence_k: usize,

    /// Maximum `Hypothesize` re-entries before the pipeline fails
    #[serde(default = "default_max_hypothesize_retries")]
    pub max_hypothesize_retries: u32,

    /// Wrap a verified Swarm answer with a consensus pass
    #[serde(default)]
    pub high_stakes: bool,

    /// Run-level deadline in milliseconds
    #[serde(default = "default_run_timeout_ms")]
    pub run_timeout_ms: u64,
}

fn default_panel() -> Vec<ModelId> {
    vec![
        ModelId::new("gemma-3-4b"),
        ModelId::new("qwen3"),
        ModelId::new("ministral-3b"),
    ]
}

fn default_lead() -> ModelId {
    ModelId::new("gemma-3-4b")
}

fn default_drafter() -> ModelId {
    ModelId::new("gemma-3-4b")
}

const fn default_evidence_k() -> usize {
    5
}

const fn default_max_hypothesize_retries() -> u32 {
    3
}

const fn default_run_timeout_ms() -> u64 {
    300_000 // 5 minutes
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            panel: default_panel(),
            lead: default_lead(),
            arena: ArenaPair::default(),
            drafter: default_drafter(),
            critic: None,
            scoring: ScoringMode::default(),
            evidence_k: default_evidence_k(),
            max_hypothesize_retries: default_max_hypothesize_retries(),
            high_stakes: false,
            run_timeout_ms: default_run_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// The critic model, falling back to the drafter
    pub fn critic_model(&self) -> &ModelId {
        self.critic.as_ref().unwrap_or(&self.drafter)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.panel.is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "consensus panel must not be empty".to_string(),
            ));
        }
        if self.panel.iter().any(ModelId::is_blank) {
            return Err(EngineError::InvalidConfiguration(
                "panel contains a blank model id".to_string(),
            ));
        }
        for (name, model) in [
            ("lead", &self.lead),
            ("drafter", &self.drafter),
            ("arena.left", &self.arena.left),
            ("arena.right", &self.arena.right),
        ] {
            if model.is_blank() {
                return Err(EngineError::InvalidConfiguration(format!(
                    "{name} model id must not be blank"
                )));
            }
        }
        if self.evidence_k == 0 {
            return Err(EngineError::InvalidConfiguration(
                "evidence_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
