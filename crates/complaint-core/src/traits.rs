use async_trait::async_trait;

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::types::{IndexEntry, Prompt, RetrievalResult};

/// Maps text to fixed-dimension vectors.
///
/// Implementations must return exactly one vector of length `dim()` per input,
/// and batching must not change the vector produced for a given text.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model/configuration (e.g. `bert:all-MiniLM-L6-v2:d384`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Produces answer text from a rendered prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, prompt: &Prompt, config: &GenerationConfig) -> anyhow::Result<String>;
}

/// Persistent nearest-neighbour store over chunk vectors.
///
/// Entries are keyed by `(doc_id, chunk_id)`; adding an existing key is
/// rejected. `search` ranks by cosine similarity and returns an empty result
/// on an empty store.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn dim(&self) -> usize;
    async fn add(&self, entries: &[IndexEntry]) -> Result<()>;
    async fn search(&self, query_vector: &[f32], k: usize) -> Result<RetrievalResult>;
    async fn persist(&self) -> Result<()>;
    async fn len(&self) -> Result<usize>;
}
