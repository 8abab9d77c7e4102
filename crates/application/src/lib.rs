//! Application layer - The orchestration engine
//!
//! Decides, for a given user query, how to combine retrieval, multiple model
//! invocations, voting, and iterative self-critique into a final answer.
//! Defines the ports to the model-serving endpoint and the vector store;
//! adapters in the infrastructure layer implement them.

pub mod config;
pub mod error;
pub mod ports;
pub mod prompts;
pub mod services;
pub mod trace;

pub use config::{ArenaPair, EngineConfig, ScoringMode};
pub use error::{EngineError, FailureStage, RunFailure};
pub use ports::*;
pub use services::*;
pub use trace::TraceRecorder;
