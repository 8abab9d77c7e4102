//! Domain layer for Crucible
//!
//! Contains the core data model of the orchestration engine: queries,
//! evidence, model responses, votes, the reasoning state machine, and the
//! append-only run trace. This layer has no I/O and no async code.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
