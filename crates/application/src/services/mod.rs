//! Engine services

mod consensus;
mod invoker;
mod orchestrator;
mod pipeline;
mod retrieval;

pub use consensus::ConsensusEngine;
pub use invoker::ModelInvoker;
pub use orchestrator::{ArenaComparison, Orchestrator, RunReport};
pub use pipeline::ReasoningPipeline;
pub use retrieval::RetrievalAugmenter;
