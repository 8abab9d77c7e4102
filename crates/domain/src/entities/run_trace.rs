//! Append-only audit trace of one orchestrated run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{EvidenceItem, ModelResponse, ReasoningStage, Vote};
use crate::errors::DomainError;
use crate::value_objects::{ResponseId, RunId};

/// One recorded event in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TraceEvent {
    /// An evidence item entered the run's working set
    Evidence(EvidenceItem),
    /// A model invocation completed (success or terminal failure)
    Response(ModelResponse),
    /// A panel model judged a candidate
    Vote(Vote),
    /// Free-form annotation (e.g. the degraded-retrieval note)
    Annotation {
        /// Short machine-readable label
        label: String,
        /// Human-readable detail
        message: String,
    },
    /// A pipeline stage transition
    StageTransition {
        from: ReasoningStage,
        to: ReasoningStage,
    },
}

/// A trace event with its position and timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Position in the trace, starting at 0
    pub seq: u64,
    /// When the event was recorded
    pub recorded_at: DateTime<Utc>,
    /// The event itself
    pub event: TraceEvent,
}

/// Append-only ordered record of everything a run produced
///
/// Entries for concurrent fan-outs are appended in call-completion order;
/// stage transitions appear in strict pipeline order. A cancelled run leaves
/// the trace truncated but well-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTrace {
    /// Run this trace belongs to
    pub run_id: RunId,
    /// When the run started
    pub started_at: DateTime<Utc>,
    entries: Vec<TraceEntry>,
}

impl RunTrace {
    /// Create an empty trace for a run
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Append an event; the only mutation the trace supports
    pub fn push(&mut self, event: TraceEvent) {
        self.entries.push(TraceEntry {
            seq: self.entries.len() as u64,
            recorded_at: Utc::now(),
            event,
        });
    }

    /// All entries in append order
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Number of recorded entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the trace is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All model responses in the trace, in completion order
    pub fn responses(&self) -> impl Iterator<Item = &ModelResponse> {
        self.entries.iter().filter_map(|e| match &e.event {
            TraceEvent::Response(r) => Some(r),
            _ => None,
        })
    }

    /// All votes in the trace
    pub fn votes(&self) -> impl Iterator<Item = &Vote> {
        self.entries.iter().filter_map(|e| match &e.event {
            TraceEvent::Vote(v) => Some(v),
            _ => None,
        })
    }

    /// Whether a response with the given id was recorded
    pub fn contains_response(&self, id: ResponseId) -> bool {
        self.responses().any(|r| r.id == id)
    }

    /// Check that every vote's candidate references a recorded response
    pub fn verify_vote_integrity(&self) -> Result<(), DomainError> {
        for vote in self.votes() {
            if !self.contains_response(vote.candidate) {
                return Err(DomainError::VoteWithoutCandidate {
                    voter: vote.voter.to_string(),
                    candidate: vote.candidate.to_string(),
                });
            }
        }
        Ok(())
    }
}
