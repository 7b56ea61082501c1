use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use complaint_cli::{init_tracing, load_settings, snippet};
use complaint_embed::load_embedder;
use complaint_rag::Retriever;
use complaint_vector::LanceIndex;

/// Semantic search over the indexed complaints, without generation.
#[derive(Debug, Parser)]
#[command(name = "complaint-search", version)]
struct Args {
    /// Number of hits (default: retrieval.top_k)
    #[arg(long)]
    top_k: Option<usize>,
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = load_settings()?;
    let k = args.top_k.unwrap_or(settings.retrieval.top_k);
    let query = args.query.join(" ");
    if query.trim().is_empty() { anyhow::bail!("query must not be empty"); }

    let embedder = load_embedder(&settings.embedding)?;
    let index = LanceIndex::load(Path::new(&settings.index.dir), embedder.embedder_id(), embedder.dim()).await?;
    let retriever = Retriever::new(embedder, Arc::new(index), settings.embedding.timeout())?;

    let result = retriever.retrieve(query.trim(), k).await?;
    println!("🔍 '{}' -> {} hits", query.trim(), result.len());
    for (i, hit) in result.iter().enumerate() {
        println!("{}. [{}] complaint {} chunk {} (score {:.3})", i + 1, hit.category, hit.doc_id, hit.chunk_id, hit.score);
        println!("   {}", snippet(&hit.chunk_text, 200));
    }
    Ok(())
}
