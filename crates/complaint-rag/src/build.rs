use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use complaint_core::chunker::{Chunker, ChunkingConfig};
use complaint_core::traits::{Embedder, VectorIndex};
use complaint_core::types::{IndexEntry, Record};
use complaint_core::{Error, Result};

use crate::embedding::embed_with_timeout;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub batch_size: usize,
    pub embed_timeout: Duration,
    pub show_progress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self { Self { batch_size: 64, embed_timeout: Duration::from_secs(30), show_progress: false } }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub records: usize,
    pub skipped: usize,
    pub chunks: usize,
    /// Entries in the index after the build, including earlier runs.
    pub index_entries: usize,
}

/// Chunk, embed and store `records`, then persist the index.
///
/// Configuration is checked before any embedding call. Each batch of
/// `options.batch_size` chunks is embedded under `options.embed_timeout`.
pub async fn build_index(
    records: &[Record],
    chunking: &ChunkingConfig,
    embedder: Arc<dyn Embedder>,
    index: &dyn VectorIndex,
    options: &BuildOptions,
) -> Result<BuildReport> {
    let chunker = Chunker::new(chunking.clone())?;
    if options.batch_size == 0 {
        return Err(Error::Configuration("batch_size must be at least 1".into()));
    }
    if embedder.dim() != index.dim() {
        return Err(Error::Configuration(format!(
            "embedder '{}' produces {}-d vectors but the index stores {}-d vectors",
            embedder.embedder_id(),
            embedder.dim(),
            index.dim()
        )));
    }

    let start = Instant::now();
    let corpus = chunker.chunk_records(records)?;

    let pb = if options.show_progress { ProgressBar::new(corpus.chunks.len() as u64) } else { ProgressBar::hidden() };
    if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}") {
        pb.set_style(style.progress_chars("#>-"));
    }

    for (n, batch) in corpus.chunks.chunks(options.batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|c| c.chunk.chunk_text.clone()).collect();
        let vectors = embed_with_timeout(embedder.clone(), texts, options.embed_timeout).await?;
        let entries: Vec<IndexEntry> = batch.iter().zip(vectors).map(|(c, v)| IndexEntry::from_chunk(c, v)).collect();
        index.add(&entries).await?;
        pb.inc(entries.len() as u64);
        tracing::debug!(batch = n, size = entries.len(), "indexed batch");
    }

    index.persist().await?;
    let index_entries = index.len().await?;
    pb.finish_with_message("done");
    tracing::info!(chunks = corpus.chunks.len(), index_entries, elapsed = ?start.elapsed(), "index build complete");

    Ok(BuildReport { records: corpus.records, skipped: corpus.skipped, chunks: corpus.chunks.len(), index_entries })
}
