//! ChromaDB vector store integration
//!
//! HTTP client for Chroma's v2 REST API: collection resolution
//! (get-or-create by name), nearest-neighbor query by embedding, and
//! document ingestion. Distances are converted to relevance scores before
//! they leave this crate.

mod client;
mod config;
mod error;
mod models;

pub use client::ChromaClient;
pub use config::ChromaConfig;
pub use error::ChromaError;
pub use models::ChromaHit;
