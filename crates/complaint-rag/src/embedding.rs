use std::sync::Arc;
use std::time::Duration;

use complaint_core::traits::Embedder;
use complaint_core::{Error, Result};

/// Run a blocking embed call off the async threads, bounded by `timeout`.
///
/// The returned vectors are checked for count, width and finiteness; any
/// violation is reported as an embedding service failure.
pub async fn embed_with_timeout(embedder: Arc<dyn Embedder>, texts: Vec<String>, timeout: Duration) -> Result<Vec<Vec<f32>>> {
    let expected = texts.len();
    let dim = embedder.dim();
    let task = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts));
    let vectors = tokio::time::timeout(timeout, task)
        .await
        .map_err(|_| Error::Timeout { stage: "embedding", after: timeout })?
        .map_err(Error::embedding)?
        .map_err(|e| Error::embedding(format!("{e:#}")))?;

    if vectors.len() != expected {
        return Err(Error::embedding(format!("embedder returned {} vectors for {} texts", vectors.len(), expected)));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err(Error::embedding(format!("embedder returned a vector of length {} (expected {})", bad.len(), dim)));
    }
    if vectors.iter().flatten().any(|x| !x.is_finite()) {
        return Err(Error::embedding("embedder returned non-finite values"));
    }
    Ok(vectors)
}
