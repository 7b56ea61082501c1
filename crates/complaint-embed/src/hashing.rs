use anyhow::Result;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use complaint_core::traits::Embedder;

/// Deterministic feature-hashing embedder.
///
/// Lower-cased alphanumeric tokens are hashed into `dim` buckets and the
/// result is L2-normalised. Texts that share words get positive cosine
/// similarity; no model files are needed.
pub struct HashEmbedder { dim: usize, id: String }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1), id: format!("hash:xxh64:d{}", dim.max(1)) } }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        let mut any = false;
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 1.0 + (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            any = true;
        }
        if !any { v[0] = 1.0; }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for HashEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_one(t)).collect()) }
}
