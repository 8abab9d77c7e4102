//! Panel consensus with lead synthesis
//!
//! The same prompt goes to every panel model concurrently; more than half
//! must answer or the round fails before any synthesis is attempted. The
//! lead model then folds the surviving candidates into one answer.

use domain::{ModelId, ResponseId, Vote};
use futures::future::join_all;
use tracing::{debug, instrument, warn};

use crate::config::ScoringMode;
use crate::error::EngineError;
use crate::prompts;
use crate::services::ModelInvoker;
use crate::trace::TraceRecorder;

/// A surviving candidate answer, keyed by its panel position
struct Candidate {
    panel_index: usize,
    model: ModelId,
    response_id: ResponseId,
    text: String,
}

/// Fan-out/fan-in consensus over a fixed model panel
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    invoker: ModelInvoker,
    scoring: ScoringMode,
}

impl ConsensusEngine {
    /// Create a consensus engine with the configured scoring mode
    pub fn new(invoker: ModelInvoker, scoring: ScoringMode) -> Self {
        Self { invoker, scoring }
    }

    /// Dispatch a prompt to the panel and synthesize a final answer
    ///
    /// Fails with `ConsensusQuorumFailed` when half or fewer of the panel
    /// answer; the lead call is never attempted in that case. A failed lead
    /// call is `SynthesisFailed` since no fallback lead exists.
    #[instrument(skip(self, prompt, recorder), fields(panel = panel.len(), lead = %lead))]
    pub async fn consensus(
        &self,
        prompt: &str,
        panel: &[ModelId],
        lead: &ModelId,
        recorder: &TraceRecorder,
    ) -> Result<String, EngineError> {
        let outcomes = join_all(
            panel
                .iter()
                .map(|model| self.invoker.invoke(model, prompt, recorder)),
        )
        .await;

        // Results stay in panel order regardless of arrival order, so the
        // tie-break below is deterministic under network jitter.
        let mut candidates: Vec<Candidate> = Vec::new();
        for (panel_index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(response) => {
                    if let Some(text) = response.text() {
                        candidates.push(Candidate {
                            panel_index,
                            model: response.model.clone(),
                            response_id: response.id,
                            text: text.to_string(),
                        });
                    }
                },
                Err(error) => warn!(%error, "Panel model failed"),
            }
        }

        if candidates.len() * 2 <= panel.len() {
            return Err(EngineError::ConsensusQuorumFailed {
                succeeded: candidates.len(),
                panel: panel.len(),
            });
        }
        debug!(candidates = candidates.len(), "Quorum reached");

        if self.scoring == ScoringMode::PeerReview {
            self.rank_by_peer_votes(prompt, &mut candidates, recorder)
                .await;
        }

        let ranked: Vec<(ModelId, String)> = candidates
            .into_iter()
            .map(|c| (c.model, c.text))
            .collect();
        let synthesis_prompt = prompts::synthesize(prompt, &ranked);
        let response = self
            .invoker
            .invoke(lead, &synthesis_prompt, recorder)
            .await
            .map_err(|error| EngineError::SynthesisFailed(Box::new(error)))?;
        response
            .text()
            .map(ToString::to_string)
            .ok_or_else(|| {
                EngineError::SynthesisFailed(Box::new(EngineError::ModelUnavailable {
                    model: lead.clone(),
                    reason: "synthesis produced no text".to_string(),
                }))
            })
    }

    /// Each surviving model scores every other candidate; candidates are
    /// reordered by mean score, ties broken by panel position.
    async fn rank_by_peer_votes(
        &self,
        prompt: &str,
        candidates: &mut [Candidate],
        recorder: &TraceRecorder,
    ) {
        let mut ballots = Vec::new();
        for voter in candidates.iter() {
            for candidate in candidates.iter() {
                if voter.panel_index != candidate.panel_index {
                    ballots.push((voter.model.clone(), candidate.response_id, candidate.panel_index));
                }
            }
        }

        let vote_prompts: Vec<String> = ballots
            .iter()
            .map(|(_, _, index)| {
                let candidate = candidates
                    .iter()
                    .find(|c| c.panel_index == *index)
                    .map_or("", |c| c.text.as_str());
                prompts::peer_vote(prompt, candidate)
            })
            .collect();

        let replies = join_all(
            ballots
                .iter()
                .zip(&vote_prompts)
                .map(|((voter, _, _), vote_prompt)| self.invoker.invoke(voter, vote_prompt, recorder)),
        )
        .await;

        let mut totals: Vec<(usize, f32, u32)> = candidates
            .iter()
            .map(|c| (c.panel_index, 0.0, 0))
            .collect();
        for ((voter, response_id, panel_index), reply) in ballots.into_iter().zip(replies) {
            match reply {
                Ok(response) => {
                    let Some(score) = response.text().and_then(parse_score) else {
                        warn!(voter = %voter, "Unparseable vote reply, skipping");
                        continue;
                    };
                    let vote = Vote::new(voter, response_id, score);
                    recorder.record_vote(vote.clone());
                    if let Some(total) = totals.iter_mut().find(|(i, _, _)| *i == panel_index) {
                        total.1 += vote.score;
                        total.2 += 1;
                    }
                },
                Err(error) => warn!(voter = %voter, %error, "Vote call failed, skipping"),
            }
        }

        let mean = |index: usize| -> f32 {
            totals
                .iter()
                .find(|(i, _, _)| *i == index)
                .filter(|(_, _, count)| *count > 0)
                .map_or(0.0, |(_, sum, count)| sum / *count as f32)
        };
        candidates.sort_by(|a, b| {
            mean(b.panel_index)
                .total_cmp(&mean(a.panel_index))
                .then(a.panel_index.cmp(&b.panel_index))
        });
    }
}

/// First numeric token in a vote reply, e.g. "8" or "Score: 7.5/10"
fn parse_score(reply: &str) -> Option<f32> {
    reply
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .find(|token| !token.is_empty() && token.chars().any(|c| c.is_ascii_digit()))
        .and_then(|token| token.parse().ok())
}
