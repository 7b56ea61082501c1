//! Error taxonomy shared by every stage of the pipeline.
//!
//! Capability implementations (embedders, generators) report failures as
//! `anyhow::Error`; the pipeline classifies them into these variants at the
//! boundary so callers can match on the kind of failure.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Embedding service failed: {0}")]
    EmbeddingService(String),

    #[error("Generation service failed: {0}")]
    GenerationService(String),

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Duplicate index entry: doc_id={doc_id} chunk_id={chunk_id}")]
    DuplicateEntry { doc_id: String, chunk_id: usize },

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },

    #[error("Index storage failed: {0}")]
    Storage(String),
}

impl Error {
    pub fn embedding(err: impl std::fmt::Display) -> Self { Self::EmbeddingService(err.to_string()) }

    pub fn generation(err: impl std::fmt::Display) -> Self { Self::GenerationService(err.to_string()) }

    pub fn storage(err: impl std::fmt::Display) -> Self { Self::Storage(err.to_string()) }

    pub fn unavailable(err: impl std::fmt::Display) -> Self { Self::IndexUnavailable(err.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
