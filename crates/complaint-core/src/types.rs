//! Domain types flowing through the build and query phases.

use serde::{Deserialize, Serialize};

pub type DocId = String;

/// One cleaned complaint narrative as delivered by the ingestion stage.
///
/// - `id`: the complaint identifier, unique within a corpus
/// - `category`: canonical product label (e.g. "BNPL", "Credit card")
/// - `text`: the cleaned narrative; may be blank, in which case it is skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: DocId,
    pub category: String,
    pub text: String,
}

impl Record {
    pub fn new(id: impl Into<DocId>, category: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), category: category.into(), text: text.into() }
    }
}

/// A contiguous window of a record's text.
///
/// Offsets are character (Unicode scalar) positions into the record text;
/// `char_end` is exclusive. `chunk_id` is the 0-based position within the
/// owning document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_text: String,
    pub doc_id: DocId,
    pub chunk_id: usize,
    pub char_start: usize,
    pub char_end: usize,
}

/// A chunk together with the metadata needed to cite it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedChunk {
    pub chunk: Chunk,
    pub category: String,
}

/// The unit persisted by a vector index, keyed by `(doc_id, chunk_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub vector: Vec<f32>,
    pub doc_id: DocId,
    pub chunk_id: usize,
    pub category: String,
    pub chunk_text: String,
    pub char_start: usize,
    pub char_end: usize,
}

impl IndexEntry {
    pub fn from_chunk(chunk: &CategorizedChunk, vector: Vec<f32>) -> Self {
        Self {
            vector,
            doc_id: chunk.chunk.doc_id.clone(),
            chunk_id: chunk.chunk.chunk_id,
            category: chunk.category.clone(),
            chunk_text: chunk.chunk.chunk_text.clone(),
            char_start: chunk.chunk.char_start,
            char_end: chunk.chunk.char_end,
        }
    }

    /// Storage key; unique per index.
    pub fn key(&self) -> String { entry_key(&self.doc_id, self.chunk_id) }
}

pub fn entry_key(doc_id: &str, chunk_id: usize) -> String { format!("{doc_id}:{chunk_id}") }

/// One ranked match. `score` is cosine similarity, higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub chunk_text: String,
    pub doc_id: DocId,
    pub chunk_id: usize,
    pub category: String,
    pub score: f32,
}

/// Hits ordered by descending score, ties broken by `(doc_id, chunk_id)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub hits: Vec<RetrievalHit>,
}

impl RetrievalResult {
    /// Sort into canonical rank order and keep at most `k` hits.
    pub fn ranked(mut hits: Vec<RetrievalHit>, k: usize) -> Self {
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(k);
        Self { hits }
    }

    pub fn len(&self) -> usize { self.hits.len() }

    pub fn is_empty(&self) -> bool { self.hits.is_empty() }

    pub fn iter(&self) -> std::slice::Iter<'_, RetrievalHit> { self.hits.iter() }
}

/// A grounding prompt ready for a generator.
///
/// `context` is the rank-ordered concatenation of the first `included`
/// retrieved chunk texts; `text` is the full rendered instruction string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub context: String,
    pub question: String,
    pub included: usize,
    pub text: String,
}

impl Prompt {
    /// The instruction string sent to the generator.
    pub fn render(&self) -> &str { &self.text }

    pub fn has_context(&self) -> bool { self.included > 0 }
}

/// What the caller gets back from a question.
///
/// `sources` is the full retrieval the answer was produced from, in rank
/// order; `Prompt::included` tells how many of them fit in the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer_text: String,
    pub sources: Vec<RetrievalHit>,
}
