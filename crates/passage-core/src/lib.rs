//! passage-core
//!
//! Shared vocabulary for the retrieval workspace: passage types, the
//! collaborator traits (embedding, vector store, retriever), the error
//! taxonomy, configuration and the text chunking used during ingestion.

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use types::{Candidate, CorpusDump, Meta, Retrieved, VectorMatches};
