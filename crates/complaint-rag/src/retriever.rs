use std::sync::Arc;
use std::time::Duration;

use complaint_core::traits::{Embedder, VectorIndex};
use complaint_core::types::RetrievalResult;
use complaint_core::{Error, Result};

use crate::embedding::embed_with_timeout;

/// Embeds a question and looks up its nearest chunks.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    embed_timeout: Duration,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, embed_timeout: Duration) -> Result<Self> {
        if embedder.dim() != index.dim() {
            return Err(Error::Configuration(format!(
                "embedder '{}' produces {}-d vectors but the index stores {}-d vectors",
                embedder.embedder_id(),
                embedder.dim(),
                index.dim()
            )));
        }
        Ok(Self { embedder, index, embed_timeout })
    }

    pub async fn retrieve(&self, question: &str, k: usize) -> Result<RetrievalResult> {
        let mut vectors = embed_with_timeout(self.embedder.clone(), vec![question.to_string()], self.embed_timeout).await?;
        let query = vectors.pop().ok_or_else(|| Error::embedding("no vector for the question"))?;
        let result = self.index.search(&query, k).await?;
        tracing::debug!(k, hits = result.len(), "retrieved");
        Ok(result)
    }
}
