//! Shared trace recorder for one run

use std::fmt;
use std::sync::Arc;

use domain::{EvidenceItem, ModelResponse, ReasoningStage, RunId, RunTrace, TraceEvent, Vote};
use parking_lot::Mutex;

/// Cloneable handle to the run's append-only trace
///
/// Concurrent fan-out tasks of the same run share one recorder; entries land
/// in call-completion order. The handle outlives a cancelled run future, so
/// dropping in-flight work leaves a truncated but well-formed trace behind.
#[derive(Clone)]
pub struct TraceRecorder {
    inner: Arc<Mutex<RunTrace>>,
}

impl fmt::Debug for TraceRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trace = self.inner.lock();
        f.debug_struct("TraceRecorder")
            .field("run_id", &trace.run_id)
            .field("entries", &trace.len())
            .finish()
    }
}

impl TraceRecorder {
    /// Create a recorder for a fresh run
    pub fn new(run_id: RunId) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RunTrace::new(run_id))),
        }
    }

    /// Id of the run being recorded
    pub fn run_id(&self) -> RunId {
        self.inner.lock().run_id
    }

    /// Record a retrieved evidence item
    pub fn record_evidence(&self, item: EvidenceItem) {
        self.inner.lock().push(TraceEvent::Evidence(item));
    }

    /// Record a completed model invocation (success or terminal failure)
    pub fn record_response(&self, response: ModelResponse) {
        self.inner.lock().push(TraceEvent::Response(response));
    }

    /// Record a panel vote
    pub fn record_vote(&self, vote: Vote) {
        self.inner.lock().push(TraceEvent::Vote(vote));
    }

    /// Record a free-form annotation (e.g. the degraded-retrieval note)
    pub fn annotate(&self, label: impl Into<String>, message: impl Into<String>) {
        self.inner.lock().push(TraceEvent::Annotation {
            label: label.into(),
            message: message.into(),
        });
    }

    /// Record a pipeline stage transition
    pub fn record_transition(&self, from: ReasoningStage, to: ReasoningStage) {
        self.inner
            .lock()
            .push(TraceEvent::StageTransition { from, to });
    }

    /// Number of entries recorded so far
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Clone of the trace as recorded so far
    pub fn snapshot(&self) -> RunTrace {
        self.inner.lock().clone()
    }

    /// Consume the recorder and take the trace
    ///
    /// Falls back to a snapshot if other handles are still alive (e.g. held
    /// by an abandoned in-flight call).
    pub fn finish(self) -> RunTrace {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner(),
            Err(shared) => shared.lock().clone(),
        }
    }
}
