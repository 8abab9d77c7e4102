//! Domain entities

mod evidence;
mod model_response;
mod query;
mod reasoning_state;
mod run_trace;
mod vote;

pub use evidence::{EvidenceItem, EvidenceOrigin};
pub use model_response::{FailureKind, ModelResponse, ResponseOutcome};
pub use query::{Query, RunMode};
pub use reasoning_state::{ReasoningStage, ReasoningState};
pub use run_trace::{RunTrace, TraceEntry, TraceEvent};
pub use vote::Vote;
