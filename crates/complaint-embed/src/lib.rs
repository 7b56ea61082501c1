//! Embedding backends for complaint chunks and questions.
//!
//! `BertEmbedder` runs a local sentence-transformer checkpoint with candle;
//! `HashEmbedder` is a deterministic, model-free stand-in for development and
//! tests. `load_embedder` picks one from settings and honours
//! `APP_USE_FAKE_EMBEDDINGS=1`.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use complaint_core::config::{EmbeddingBackend, EmbeddingSettings};
use complaint_core::traits::Embedder;

mod bert;
mod device;
mod hashing;
mod pool;
mod tokenize;

pub use bert::{BertEmbedder, resolve_model_dir};
pub use device::select_device;
pub use hashing::HashEmbedder;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_batch;

pub fn fake_embeddings_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn load_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if fake_embeddings_forced() || settings.backend == EmbeddingBackend::Hash {
        tracing::info!(dim = settings.dim, "using hash embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.dim)));
    }
    let dir = resolve_model_dir(Path::new(&settings.model_dir))?;
    Ok(Arc::new(BertEmbedder::load(&dir, settings.max_len)?))
}
