//! Model response entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ModelId, ResponseId};

/// Terminal failure category of a model invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// The call exceeded its deadline (after the single retry)
    Timeout,
    /// The model is not loaded or the endpoint rejected the call
    Unavailable,
}

/// Outcome of one model invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponseOutcome {
    /// Generation completed
    Success {
        /// Generated text
        text: String,
    },
    /// Generation failed terminally; recorded so the trace stays complete
    Failure {
        /// Failure category
        kind: FailureKind,
        /// Human-readable reason
        message: String,
    },
}

/// The immutable result of one model invocation
///
/// Many are produced per run; each is retained only in that run's trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Unique response identifier (vote candidates reference this)
    pub id: ResponseId,
    /// Model that was invoked
    pub model: ModelId,
    /// Blake3 hash of the prompt, for replay comparison without storing prompts
    pub prompt_hash: String,
    /// Success or terminal failure
    pub outcome: ResponseOutcome,
    /// Wall-clock latency of the call in milliseconds
    pub latency_ms: u64,
    /// When the call completed
    pub completed_at: DateTime<Utc>,
}

impl ModelResponse {
    /// Record a successful generation
    pub fn success(
        model: ModelId,
        prompt_hash: impl Into<String>,
        text: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            id: ResponseId::new(),
            model,
            prompt_hash: prompt_hash.into(),
            outcome: ResponseOutcome::Success { text: text.into() },
            latency_ms,
            completed_at: Utc::now(),
        }
    }

    /// Record a terminal failure
    pub fn failure(
        model: ModelId,
        prompt_hash: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            id: ResponseId::new(),
            model,
            prompt_hash: prompt_hash.into(),
            outcome: ResponseOutcome::Failure {
                kind,
                message: message.into(),
            },
            latency_ms,
            completed_at: Utc::now(),
        }
    }

    /// Whether this response is a success
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Success { .. })
    }

    /// Generated text, if the call succeeded
    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            ResponseOutcome::Success { text } => Some(text),
            ResponseOutcome::Failure { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str) -> ModelId {
        ModelId::new(name)
    }

    #[test]
    fn success_response() {
        let resp = ModelResponse::success(model("qwen3"), "abc123", "Axial tilt.", 840);
        assert!(resp.is_success());
        assert_eq!(resp.text(), Some("Axial tilt."));
        assert_eq!(resp.latency_ms, 840);
    }

    #[test]
    fn failure_response_has_no_text() {
        let resp = ModelResponse::failure(
            model("qwen3"),
            "abc123",
            FailureKind::Timeout,
            "deadline exceeded",
            30000,
        );
        assert!(!resp.is_success());
        assert_eq!(resp.text(), None);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let resp = ModelResponse::success(model("qwen3"), "h", "ok", 1);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"success\""));
    }

    #[test]
    fn distinct_responses_have_distinct_ids() {
        let a = ModelResponse::success(model("a"), "h", "x", 1);
        let b = ModelResponse::success(model("a"), "h", "x", 1);
        assert_ne!(a.id, b.id);
    }
}
