use complaint_core::config::{EmbeddingBackend, EmbeddingSettings};
use complaint_embed::load_embedder;

fn main() -> anyhow::Result<()> {
    let settings = EmbeddingSettings { backend: EmbeddingBackend::Hash, ..EmbeddingSettings::default() };
    let embedder = load_embedder(&settings)?;
    let texts = vec!["charged twice".to_string(), "account closed without notice".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("{} B={} dim={}", embedder.embedder_id(), embs.len(), embedder.dim());
    Ok(())
}
