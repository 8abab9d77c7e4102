//! Deep reasoning pipeline
//!
//! Drives the `Decompose -> Hypothesize -> Critique -> Verify` state
//! machine. Stages run strictly in order; only the per-sub-question work
//! inside `Hypothesize` fans out concurrently. Every transition is recorded
//! in the trace.

use domain::{EvidenceItem, ModelId, ReasoningStage, ReasoningState};
use futures::future::join_all;
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::error::{EngineError, FailureStage};
use crate::prompts;
use crate::services::{ModelInvoker, RetrievalAugmenter};
use crate::trace::TraceRecorder;

/// Iterative decompose/hypothesize/critique/verify reasoning over one query
#[derive(Debug, Clone)]
pub struct ReasoningPipeline {
    invoker: ModelInvoker,
    augmenter: RetrievalAugmenter,
    drafter: ModelId,
    critic: ModelId,
    evidence_k: usize,
    max_hypothesize_retries: u32,
}

impl ReasoningPipeline {
    /// Build a pipeline from the engine configuration
    pub fn new(
        invoker: ModelInvoker,
        augmenter: RetrievalAugmenter,
        config: &EngineConfig,
    ) -> Self {
        Self {
            invoker,
            augmenter,
            drafter: config.drafter.clone(),
            critic: config.critic_model().clone(),
            evidence_k: config.evidence_k,
            max_hypothesize_retries: config.max_hypothesize_retries,
        }
    }

    /// Run the state machine to completion
    ///
    /// Returns the verified hypothesis, or the stage and error the run
    /// failed in. The retry budget bounds `Hypothesize` re-entries, so the
    /// loop always terminates.
    #[instrument(skip(self, query, recorder), fields(query_len = query.len()))]
    pub async fn run(
        &self,
        query: &str,
        recorder: &TraceRecorder,
    ) -> Result<String, (FailureStage, EngineError)> {
        let mut state = ReasoningState::new();

        let sub_questions = self.decompose(query, &mut state, recorder).await?;
        debug!(sub_questions = sub_questions.len(), "Query decomposed");

        loop {
            let (hypothesis, evidence) = self
                .hypothesize(&sub_questions, &mut state, recorder)
                .await?;
            let context = prompts::evidence_context(&evidence);

            if let Some(note) = self
                .critique(&hypothesis, &context, &mut state, recorder)
                .await?
            {
                self.retry(&mut state, note, FailureStage::Critique, recorder)?;
                continue;
            }

            match self
                .verify(&hypothesis, &context, &mut state, recorder)
                .await?
            {
                None => {
                    let passed = state.pass_verification();
                    fallible(&mut state, recorder, FailureStage::Verify, passed)?;
                    recorder.record_transition(ReasoningStage::Verify, ReasoningStage::Done);
                    return Ok(hypothesis);
                },
                Some(reason) => {
                    self.retry(&mut state, reason, FailureStage::Verify, recorder)?;
                },
            }
        }
    }

    async fn decompose(
        &self,
        query: &str,
        state: &mut ReasoningState,
        recorder: &TraceRecorder,
    ) -> Result<Vec<String>, (FailureStage, EngineError)> {
        let prompt = prompts::decompose(query);
        let response = self
            .invoker
            .invoke(&self.drafter, &prompt, recorder)
            .await
            .map_err(|e| abort(state, recorder, FailureStage::Decompose, e))?;
        let mut sub_questions = parse_sub_questions(response.text().unwrap_or_default());
        if sub_questions.is_empty() {
            sub_questions.push(query.to_string());
        }
        let recorded = state.record_decomposition(sub_questions.clone());
        fallible(state, recorder, FailureStage::Decompose, recorded)?;
        recorder.record_transition(ReasoningStage::Decompose, ReasoningStage::Hypothesize);
        Ok(sub_questions)
    }

    /// Concurrent per-sub-question retrieval + drafting, joined before
    /// aggregation into one hypothesis
    async fn hypothesize(
        &self,
        sub_questions: &[String],
        state: &mut ReasoningState,
        recorder: &TraceRecorder,
    ) -> Result<(String, Vec<EvidenceItem>), (FailureStage, EngineError)> {
        let notes = state.critique_notes.clone();
        let outcomes = join_all(sub_questions.iter().map(|sub| {
            let notes = notes.clone();
            async move {
                let evidence = self
                    .augmenter
                    .retrieve(sub, self.evidence_k, recorder)
                    .await
                    .map_err(|e| (FailureStage::Retrieval, e))?;
                let context = prompts::evidence_context(&evidence);
                let prompt = prompts::hypothesize(sub, &context, &notes);
                let response = self
                    .invoker
                    .invoke(&self.drafter, &prompt, recorder)
                    .await
                    .map_err(|e| (FailureStage::Hypothesize, e))?;
                let draft = response.text().unwrap_or_default().to_string();
                Ok::<_, (FailureStage, EngineError)>((draft, evidence))
            }
        }))
        .await;

        let mut drafts = Vec::with_capacity(outcomes.len());
        let mut evidence = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok((draft, items)) => {
                    drafts.push(draft);
                    evidence.extend(items);
                },
                Err((stage, error)) => return Err(abort(state, recorder, stage, error)),
            }
        }
        let hypothesis = drafts.join("\n\n");
        let recorded = state.record_hypothesis(hypothesis.clone());
        fallible(state, recorder, FailureStage::Hypothesize, recorded)?;
        recorder.record_transition(ReasoningStage::Hypothesize, ReasoningStage::Critique);
        Ok((hypothesis, evidence))
    }

    /// `None` when the critic found no issues, `Some(note)` otherwise
    async fn critique(
        &self,
        hypothesis: &str,
        context: &str,
        state: &mut ReasoningState,
        recorder: &TraceRecorder,
    ) -> Result<Option<String>, (FailureStage, EngineError)> {
        let prompt = prompts::critique(hypothesis, context);
        let response = self
            .invoker
            .invoke(&self.critic, &prompt, recorder)
            .await
            .map_err(|e| abort(state, recorder, FailureStage::Critique, e))?;
        let reply = response.text().unwrap_or_default();
        if prompts::is_clean_critique(reply) {
            let passed = state.pass_critique();
            fallible(state, recorder, FailureStage::Critique, passed)?;
            recorder.record_transition(ReasoningStage::Critique, ReasoningStage::Verify);
            Ok(None)
        } else {
            Ok(Some(reply.to_string()))
        }
    }

    /// `None` on a pass, `Some(reason)` on an inconsistency
    async fn verify(
        &self,
        hypothesis: &str,
        context: &str,
        state: &mut ReasoningState,
        recorder: &TraceRecorder,
    ) -> Result<Option<String>, (FailureStage, EngineError)> {
        let prompt = prompts::verify(hypothesis, context);
        let response = self
            .invoker
            .invoke(&self.critic, &prompt, recorder)
            .await
            .map_err(|e| abort(state, recorder, FailureStage::Verify, e))?;
        let reply = response.text().unwrap_or_default();
        if prompts::is_verified(reply) {
            Ok(None)
        } else {
            Ok(Some(reply.to_string()))
        }
    }

    /// Retry transition back to `Hypothesize`, enforcing the budget
    fn retry(
        &self,
        state: &mut ReasoningState,
        note: String,
        stage: FailureStage,
        recorder: &TraceRecorder,
    ) -> Result<(), (FailureStage, EngineError)> {
        let from = state.stage();
        let retried = match stage {
            FailureStage::Verify => state.retry_from_verification(note),
            _ => state.retry_from_critique(note),
        };
        let retries = match retried {
            Ok(retries) => retries,
            Err(e) => return Err(abort(state, recorder, stage, EngineError::Domain(e))),
        };
        recorder.record_transition(from, ReasoningStage::Hypothesize);
        if retries > self.max_hypothesize_retries {
            let error = EngineError::MaxIterationsExceeded(self.max_hypothesize_retries);
            return Err(abort(state, recorder, stage, error));
        }
        debug!(retries, "Retrying hypothesis");
        Ok(())
    }
}

/// Mark the run failed, record the transition, and preserve the error
fn abort(
    state: &mut ReasoningState,
    recorder: &TraceRecorder,
    stage: FailureStage,
    error: EngineError,
) -> (FailureStage, EngineError) {
    let from = state.stage();
    state.fail(error.to_string());
    recorder.record_transition(from, ReasoningStage::Failed);
    (stage, error)
}

fn fallible(
    state: &mut ReasoningState,
    recorder: &TraceRecorder,
    stage: FailureStage,
    result: Result<(), domain::DomainError>,
) -> Result<(), (FailureStage, EngineError)> {
    match result {
        Ok(()) => Ok(()),
        Err(e) => Err(abort(state, recorder, stage, EngineError::Domain(e))),
    }
}

/// Parse a numbered (or bulleted) list reply into ordered sub-questions
fn parse_sub_questions(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches(['.', ')', '-', '*'])
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use domain::{RunId, SourceId, TraceEvent};
    use parking_lot::Mutex;

    use super::*;
    use crate::ports::{
        Generation, GenerationFault, GenerationOptions, GenerationPort, ScoredPassage,
        SearchFault, VectorSearchPort,
    };

    /// Routes prompts to scripted replies by their role marker.
    struct StagePort {
        critique_replies: Mutex<Vec<String>>,
        verify_replies: Mutex<Vec<String>>,
        decompose_reply: String,
        fail_decompose: bool,
        log: Mutex<Vec<String>>,
    }

    impl StagePort {
        fn new(decompose_reply: &str) -> Self {
            Self {
                critique_replies: Mutex::new(Vec::new()),
                verify_replies: Mutex::new(Vec::new()),
                decompose_reply: decompose_reply.to_string(),
                fail_decompose: false,
                log: Mutex::new(Vec::new()),
            }
        }

        fn critiques(self, replies: &[&str]) -> Self {
            *self.critique_replies.lock() = replies.iter().map(ToString::to_string).collect();
            self
        }

        fn verifications(self, replies: &[&str]) -> Self {
            *self.verify_replies.lock() = replies.iter().map(ToString::to_string).collect();
            self
        }

        fn failing_decompose(mut self) -> Self {
            self.fail_decompose = true;
            self
        }

        fn prompts_matching(&self, marker: &str) -> Vec<String> {
            self.log
                .lock()
                .iter()
                .filter(|p| p.contains(marker))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl GenerationPort for StagePort {
        async fn generate(
            &self,
            _model: &ModelId,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<Generation, GenerationFault> {
            self.log.lock().push(prompt.to_string());
            let text = if prompt.contains("Break this question") {
                if self.fail_decompose {
                    return Err(GenerationFault::Unavailable {
                        reason: "drafter offline".to_string(),
                    });
                }
                self.decompose_reply.clone()
            } else if prompt.contains("FACTUALLY INCORRECT") {
                "The misconception.".to_string()
            } else if prompt.contains("PROVOCATEUR") {
                "Seasons come from Earth's axial tilt.".to_string()
            } else if prompt.contains("the CRITIC") {
                let mut replies = self.critique_replies.lock();
                if replies.is_empty() {
                    prompts::CRITIQUE_CLEAN_SENTINEL.to_string()
                } else {
                    replies.remove(0)
                }
            } else if prompt.contains("the VERIFIER") {
                let mut replies = self.verify_replies.lock();
                if replies.is_empty() {
                    prompts::VERIFY_PASS_SENTINEL.to_string()
                } else {
                    replies.remove(0)
                }
            } else {
                "unexpected".to_string()
            };
            Ok(Generation { text })
        }
    }

    struct FixedSearch;

    #[async_trait]
    impl VectorSearchPort for FixedSearch {
        async fn search(&self, text: &str, _k: usize) -> Result<Vec<ScoredPassage>, SearchFault> {
            Ok(vec![ScoredPassage {
                source: SourceId::new(format!("src-{}", text.len())),
                text: "Earth's axis is tilted about 23.4 degrees.".to_string(),
                score: 0.9,
            }])
        }
    }

    fn pipeline(port: &Arc<StagePort>, max_retries: u32) -> ReasoningPipeline {
        let invoker = ModelInvoker::new(port.clone());
        let augmenter = RetrievalAugmenter::new(
            Arc::new(FixedSearch),
            invoker.clone(),
            ModelId::new("trap-model"),
        );
        let config = EngineConfig {
            max_hypothesize_retries: max_retries,
            ..Default::default()
        };
        ReasoningPipeline::new(invoker, augmenter, &config)
    }

    fn transitions(recorder: TraceRecorder) -> Vec<(ReasoningStage, ReasoningStage)> {
        recorder
            .finish()
            .entries()
            .iter()
            .filter_map(|entry| match &entry.event {
                TraceEvent::StageTransition { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn happy_path_reaches_done_in_one_pass() {
        let port = Arc::new(StagePort::new("1. Why does tilt matter?\n2. Why opposite seasons?"));
        let pipeline = pipeline(&port, 3);
        let recorder = TraceRecorder::new(RunId::new());

        let answer = pipeline
            .run("What causes seasons?", &recorder)
            .await
            .unwrap();

        assert!(answer.contains("axial tilt"));
        assert_eq!(port.prompts_matching("Break this question").len(), 1);
        assert_eq!(port.prompts_matching("PROVOCATEUR").len(), 2);
        assert_eq!(port.prompts_matching("the CRITIC").len(), 1);
        assert_eq!(port.prompts_matching("the VERIFIER").len(), 1);
        assert_eq!(
            transitions(recorder),
            vec![
                (ReasoningStage::Decompose, ReasoningStage::Hypothesize),
                (ReasoningStage::Hypothesize, ReasoningStage::Critique),
                (ReasoningStage::Critique, ReasoningStage::Verify),
                (ReasoningStage::Verify, ReasoningStage::Done),
            ]
        );
    }

    #[tokio::test]
    async fn critique_feedback_is_threaded_into_the_retry() {
        let port = Arc::new(
            StagePort::new("1. Only question")
                .critiques(&["The draft never cites the tilt angle."]),
        );
        let pipeline = pipeline(&port, 3);
        let recorder = TraceRecorder::new(RunId::new());

        pipeline.run("What causes seasons?", &recorder).await.unwrap();

        let drafts = port.prompts_matching("PROVOCATEUR");
        assert_eq!(drafts.len(), 2);
        assert!(!drafts[0].contains("Feedback from earlier drafts"));
        assert!(drafts[1].contains("The draft never cites the tilt angle."));
    }

    #[tokio::test]
    async fn budget_exhaustion_fails_without_extra_loops() {
        let port = Arc::new(StagePort::new("1. Only question").critiques(&[
            "wrong once",
            "wrong twice",
            "wrong thrice",
        ]));
        let pipeline = pipeline(&port, 2);
        let recorder = TraceRecorder::new(RunId::new());

        let (stage, error) = pipeline
            .run("What causes seasons?", &recorder)
            .await
            .unwrap_err();

        assert_eq!(stage, FailureStage::Critique);
        assert!(matches!(error, EngineError::MaxIterationsExceeded(2)));
        // First entry plus two permitted retries; the third retry trips the
        // budget before another draft is attempted.
        assert_eq!(port.prompts_matching("the CRITIC").len(), 3);
        assert_eq!(port.prompts_matching("PROVOCATEUR").len(), 3);
        let last = transitions(recorder).pop().unwrap();
        assert_eq!(last.1, ReasoningStage::Failed);
    }

    #[tokio::test]
    async fn verification_failure_retries_with_reason() {
        let port = Arc::new(
            StagePort::new("1. Only question")
                .verifications(&["The equinox claim is unsupported."]),
        );
        let pipeline = pipeline(&port, 3);
        let recorder = TraceRecorder::new(RunId::new());

        pipeline.run("What causes seasons?", &recorder).await.unwrap();

        let drafts = port.prompts_matching("PROVOCATEUR");
        assert_eq!(drafts.len(), 2);
        assert!(drafts[1].contains("The equinox claim is unsupported."));
        assert_eq!(port.prompts_matching("the VERIFIER").len(), 2);
    }

    #[tokio::test]
    async fn terminal_invoker_failure_aborts_the_run() {
        let port = Arc::new(StagePort::new("unused").failing_decompose());
        let pipeline = pipeline(&port, 3);
        let recorder = TraceRecorder::new(RunId::new());

        let (stage, error) = pipeline
            .run("What causes seasons?", &recorder)
            .await
            .unwrap_err();

        assert_eq!(stage, FailureStage::Decompose);
        assert!(matches!(error, EngineError::ModelUnavailable { .. }));
        assert_eq!(
            transitions(recorder),
            vec![(ReasoningStage::Decompose, ReasoningStage::Failed)]
        );
    }

    #[test]
    fn sub_question_parsing() {
        assert_eq!(
            parse_sub_questions("1. First?\n2) Second?\n- Third?"),
            vec!["First?", "Second?", "Third?"]
        );
        assert_eq!(parse_sub_questions("Just one line"), vec!["Just one line"]);
        assert!(parse_sub_questions("\n   \n").is_empty());
    }
}
