use std::path::PathBuf;

use clap::Parser;

use complaint_cli::{init_tracing, load_settings};
use complaint_core::corpus::load_corpus;
use complaint_embed::load_embedder;
use complaint_rag::{build_index, BuildOptions};
use complaint_vector::LanceIndex;

/// Chunk, embed and index the complaint corpus.
#[derive(Debug, Parser)]
#[command(name = "complaint-indexer", version)]
struct Args {
    /// CSV file or directory of CSV files (default: corpus.path)
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// LanceDB directory (default: index.dir)
    #[arg(long)]
    index_dir: Option<PathBuf>,
    #[arg(long)]
    chunk_size: Option<usize>,
    #[arg(long)]
    chunk_overlap: Option<usize>,
    /// Delete any existing index before building
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut settings = load_settings()?;
    if let Some(size) = args.chunk_size { settings.chunking.chunk_size = size; }
    if let Some(overlap) = args.chunk_overlap { settings.chunking.chunk_overlap = overlap; }
    settings.validate()?;

    let corpus_path = args.corpus.unwrap_or_else(|| PathBuf::from(&settings.corpus.path));
    let index_dir = args.index_dir.unwrap_or_else(|| PathBuf::from(&settings.index.dir));
    println!("Complaint indexer\n=================");
    println!("Corpus: {}", corpus_path.display());
    println!("Index:  {}", index_dir.display());

    let records = load_corpus(&corpus_path)?;
    let embedder = load_embedder(&settings.embedding)?;

    if args.fresh && index_dir.exists() {
        tracing::info!(dir = %index_dir.display(), "removing existing index");
        std::fs::remove_dir_all(&index_dir)?;
    }
    let index = LanceIndex::create(&index_dir, embedder.embedder_id(), embedder.dim()).await?;
    let options = BuildOptions {
        batch_size: settings.embedding.batch_size,
        embed_timeout: settings.embedding.timeout(),
        show_progress: true,
    };
    let report = build_index(&records, &settings.chunking, embedder.clone(), &index, &options).await?;

    println!("\n✅ Indexing completed");
    println!("📊 {} records read, {} skipped (blank narrative)", report.records, report.skipped);
    println!("📊 {} chunks embedded with {}", report.chunks, embedder.embedder_id());
    println!("📊 {} entries in {}", report.index_entries, index_dir.display());
    println!("\n💡 Ask a question with: cargo run --bin complaint-ask -- '<question>'");
    Ok(())
}
