use complaint_core::config::{EmbeddingBackend, EmbeddingSettings};
use complaint_core::traits::Embedder;
use complaint_embed::{load_embedder, HashEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(384);
    let texts = vec!["Affirm charged me twice".to_string(), "Affirm charged me twice".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim is 384");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn batching_does_not_change_vectors() {
    let embedder = HashEmbedder::new(128);
    let texts: Vec<String> = ["late fee", "closed my savings account", "debt collector keeps calling"].iter().map(|s| s.to_string()).collect();
    let batched = embedder.embed_batch(&texts).expect("batch");
    for (text, expected) in texts.iter().zip(&batched) {
        let single = embedder.embed_batch(std::slice::from_ref(text)).expect("single");
        assert_eq!(&single[0], expected);
    }
}

#[test]
fn shared_words_score_higher_than_unrelated_text() {
    let embedder = HashEmbedder::new(384);
    let texts: Vec<String> = ["Why was I charged twice by Affirm?", "Affirm charged me twice for one purchase.", "The bank closed my savings account."]
        .iter().map(|s| s.to_string()).collect();
    let v = embedder.embed_batch(&texts).expect("embed");
    assert!(cosine(&v[0], &v[1]) > cosine(&v[0], &v[2]));
    assert!(cosine(&v[0], &v[1]) > 0.3);
}

#[test]
fn punctuation_only_text_still_yields_a_unit_vector() {
    let v = HashEmbedder::new(16).embed_batch(&["?!".to_string()]).expect("embed").remove(0);
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3);
}

#[test]
fn settings_select_hash_backend() {
    let settings = EmbeddingSettings { backend: EmbeddingBackend::Hash, dim: 64, ..EmbeddingSettings::default() };
    let embedder = load_embedder(&settings).expect("embedder");
    assert_eq!(embedder.dim(), 64);
    assert_eq!(embedder.embedder_id(), "hash:xxh64:d64");
}

#[test]
fn missing_model_dir_is_reported() {
    let settings = EmbeddingSettings { backend: EmbeddingBackend::Bert, model_dir: "/definitely/not/here".into(), ..EmbeddingSettings::default() };
    if complaint_embed::fake_embeddings_forced() || std::env::var("APP_MODEL_DIR").is_ok() { return; }
    assert!(load_embedder(&settings).is_err());
}
