//! Value objects for the orchestration domain

mod model_id;
mod query_id;
mod response_id;
mod run_id;
mod session_id;
mod source_id;

pub use model_id::ModelId;
pub use query_id::QueryId;
pub use response_id::ResponseId;
pub use run_id::RunId;
pub use session_id::SessionId;
pub use source_id::SourceId;
