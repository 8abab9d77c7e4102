//! Port adapters for external services

mod chroma_search;
mod moka_answer_cache;
mod ollama_generation;

pub use chroma_search::ChromaSearchAdapter;
pub use moka_answer_cache::MokaAnswerCache;
pub use ollama_generation::OllamaGenerationAdapter;
