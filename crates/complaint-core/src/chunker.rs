//! Character-window chunking of complaint narratives.
//!
//! Windows are `chunk_size` characters long and consecutive windows share
//! exactly `chunk_overlap` characters. With `ChunkBoundary::Whitespace` a
//! window may end early, just after the last whitespace it contains, so words
//! are not cut in half; the following window still starts `chunk_overlap`
//! characters before that end.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{CategorizedChunk, Chunk, Record};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkBoundary {
    #[default]
    Fixed,
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub boundary: ChunkBoundary,
}

impl Default for ChunkingConfig {
    fn default() -> Self { Self { chunk_size: 300, chunk_overlap: 50, boundary: ChunkBoundary::Whitespace } }
}

impl ChunkingConfig {
    pub fn fixed(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap, boundary: ChunkBoundary::Fixed }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Configuration("chunk_size must be at least 1".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Chunks of a whole corpus plus bookkeeping for the build report.
#[derive(Debug, Clone, Default)]
pub struct ChunkedCorpus {
    pub chunks: Vec<CategorizedChunk>,
    pub records: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Fails with a configuration error unless `0 <= overlap < chunk_size`.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig { &self.config }

    /// Split one narrative. Blank input yields no chunks.
    pub fn chunk_document(&self, doc_id: &str, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0usize;
        loop {
            let mut end = (start + size).min(total);
            if end < total && self.config.boundary == ChunkBoundary::Whitespace {
                // keep end > start + overlap so the next window still advances
                if let Some(cut) = (start + overlap + 1..=end).rev().find(|&i| chars[i - 1].is_whitespace()) {
                    end = cut;
                }
            }
            chunks.push(Chunk {
                chunk_text: chars[start..end].iter().collect(),
                doc_id: doc_id.to_string(),
                chunk_id: chunks.len(),
                char_start: start,
                char_end: end,
            });
            if end >= total {
                break;
            }
            start = end - overlap;
        }
        chunks
    }

    /// Chunk every record, skipping blank narratives.
    ///
    /// Record ids must be unique; a repeated id is a validation error since it
    /// would produce colliding index keys.
    pub fn chunk_records(&self, records: &[Record]) -> Result<ChunkedCorpus> {
        let mut seen = HashSet::with_capacity(records.len());
        let mut out = ChunkedCorpus { records: records.len(), ..ChunkedCorpus::default() };
        for record in records {
            if !seen.insert(record.id.as_str()) {
                return Err(Error::Validation(format!("duplicate complaint id '{}' in corpus", record.id)));
            }
            let chunks = self.chunk_document(&record.id, &record.text);
            if chunks.is_empty() {
                tracing::debug!(doc_id = %record.id, "skipping record with empty narrative");
                out.skipped += 1;
                continue;
            }
            out.chunks.extend(chunks.into_iter().map(|chunk| CategorizedChunk { chunk, category: record.category.clone() }));
        }
        tracing::info!(records = out.records, skipped = out.skipped, chunks = out.chunks.len(), "chunked corpus");
        Ok(out)
    }
}

/// Fixed-window chunking of a single text.
pub fn chunk(doc_id: &str, text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(Chunker::new(ChunkingConfig::fixed(chunk_size, overlap))?.chunk_document(doc_id, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut out: Vec<char> = Vec::new();
        for c in chunks {
            let skip = out.len() - c.char_start;
            out.extend(c.chunk_text.chars().skip(skip));
        }
        out.into_iter().collect()
    }

    #[test]
    fn fixed_windows_advance_by_size_minus_overlap() {
        let text: String = (0..120).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk("d", &text, 50, 10).expect("chunk");
        let spans: Vec<(usize, usize)> = chunks.iter().map(|c| (c.char_start, c.char_end)).collect();
        assert_eq!(spans, vec![(0, 50), (40, 90), (80, 120)]);
        assert_eq!(chunks[2].chunk_text.chars().count(), 40);
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chunk_text.chars().skip(40).collect();
            let head: String = pair[1].chunk_text.chars().take(10).collect();
            assert_eq!(tail, head);
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk("1", "Affirm charged me twice for one purchase.", 50, 10).expect("chunk");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_text, "Affirm charged me twice for one purchase.");
        assert_eq!(chunks[0].chunk_id, 0);
    }

    #[test]
    fn blank_text_yields_nothing() {
        assert!(chunk("d", "", 10, 2).expect("chunk").is_empty());
        assert!(chunk("d", " \n\t ", 10, 2).expect("chunk").is_empty());
    }

    #[test]
    fn invalid_overlap_is_rejected() {
        assert!(matches!(chunk("d", "abc", 10, 10), Err(Error::Configuration(_))));
        assert!(matches!(chunk("d", "abc", 0, 0), Err(Error::Configuration(_))));
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let text = "é".repeat(30);
        let chunks = chunk("d", &text, 20, 5).expect("chunk");
        assert_eq!(chunks[0].chunk_text.chars().count(), 20);
        assert_eq!(chunks[1].char_start, 15);
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn whitespace_boundary_keeps_words_and_exact_overlap() {
        let text = "the card issuer refused to reverse a duplicate charge even after I sent the receipts twice";
        let chunker = Chunker::new(ChunkingConfig { chunk_size: 30, chunk_overlap: 8, boundary: ChunkBoundary::Whitespace }).expect("chunker");
        let chunks = chunker.chunk_document("d", text);
        assert!(chunks.len() > 1);
        for c in &chunks[..chunks.len() - 1] {
            assert!(c.chunk_text.ends_with(' '), "window should end after whitespace: {:?}", c.chunk_text);
            assert!(c.chunk_text.chars().count() <= 30);
        }
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].char_start, pair[0].char_end - 8);
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn whitespace_boundary_falls_back_to_hard_cut() {
        let text = "x".repeat(25);
        let chunker = Chunker::new(ChunkingConfig { chunk_size: 10, chunk_overlap: 2, boundary: ChunkBoundary::Whitespace }).expect("chunker");
        let spans: Vec<(usize, usize)> = chunker.chunk_document("d", &text).iter().map(|c| (c.char_start, c.char_end)).collect();
        assert_eq!(spans, vec![(0, 10), (8, 18), (16, 25)]);
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "Late fees were added to my account although I paid on time. ".repeat(12);
        let a = chunk("d", &text, 64, 16).expect("chunk");
        let b = chunk("d", &text, 64, 16).expect("chunk");
        assert_eq!(a, b);
    }

    #[test]
    fn corpus_chunking_skips_blank_and_rejects_duplicate_ids() {
        let chunker = Chunker::new(ChunkingConfig::fixed(50, 10)).expect("chunker");
        let records = vec![Record::new("1", "BNPL", "Affirm charged me twice."), Record::new("2", "Credit card", "   ")];
        let out = chunker.chunk_records(&records).expect("chunk records");
        assert_eq!((out.records, out.skipped, out.chunks.len()), (2, 1, 1));
        assert_eq!(out.chunks[0].category, "BNPL");

        let dup = vec![Record::new("1", "a", "x"), Record::new("1", "b", "y")];
        assert!(matches!(chunker.chunk_records(&dup), Err(Error::Validation(_))));
    }
}
