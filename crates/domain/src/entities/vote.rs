//! Vote entity

use serde::{Deserialize, Serialize};

use crate::value_objects::{ModelId, ResponseId};

/// One panel model's judgment on a candidate answer
///
/// Consumed once during consensus aggregation, then archived in the trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// Model that cast the vote
    pub voter: ModelId,
    /// Candidate response being judged
    pub candidate: ResponseId,
    /// Score in [0, 10], higher is better
    pub score: f32,
}

impl Vote {
    /// Create a vote, clamping the score into [0, 10]
    pub fn new(voter: ModelId, candidate: ResponseId, score: f32) -> Self {
        Self {
            voter,
            candidate,
            score: score.clamp(0.0, 10.0),
        }
    }
}
