//! Port definitions for the orchestration engine
//!
//! Ports are the interfaces to the external collaborators: the model-serving
//! endpoint (GPU-affine) and the vector store and answer cache (CPU-affine).
//! Adapters in the infrastructure layer implement them; tests substitute
//! mocks.

mod answer_cache_port;
mod generation_port;
mod vector_search_port;

pub use answer_cache_port::AnswerCachePort;
pub use generation_port::{Generation, GenerationFault, GenerationOptions, GenerationPort};
pub use vector_search_port::{ScoredPassage, SearchFault, VectorSearchPort};
