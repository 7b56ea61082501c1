use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use complaint_cli::{init_tracing, load_settings, snippet};
use complaint_embed::load_embedder;
use complaint_rag::{OpenAiCompatGenerator, PipelineSettings, RagPipeline};
use complaint_vector::LanceIndex;

/// Answer a question from the indexed complaints.
#[derive(Debug, Parser)]
#[command(name = "complaint-ask", version)]
struct Args {
    /// Number of excerpts to retrieve (default: retrieval.top_k)
    #[arg(long)]
    top_k: Option<usize>,
    /// Print the full prompt sent to the model
    #[arg(long)]
    show_prompt: bool,
    #[arg(required = true, num_args = 1..)]
    question: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut settings = load_settings()?;
    if let Some(k) = args.top_k { settings.retrieval.top_k = k; }
    let question = args.question.join(" ");

    let embedder = load_embedder(&settings.embedding)?;
    let index = LanceIndex::load(Path::new(&settings.index.dir), embedder.embedder_id(), embedder.dim()).await?;
    let generator = OpenAiCompatGenerator::new(&settings.generation)?;
    tracing::info!(url = generator.url(), "using generator");
    let pipeline = RagPipeline::new(embedder, Arc::new(index), Arc::new(generator), PipelineSettings::from_settings(&settings))?;

    let (answer, prompt) = pipeline.ask_with_prompt(&question).await?;
    if args.show_prompt {
        println!("--- prompt ---\n{}\n--------------\n", prompt.render());
    }
    println!("Q: {}\n", answer.question);
    println!("A: {}\n", answer.answer_text);
    if answer.sources.is_empty() {
        println!("(no matching complaints were found)");
    } else {
        println!("Sources:");
        for (i, hit) in answer.sources.iter().enumerate() {
            println!("{}. [{}] complaint {} (score {:.3})", i + 1, hit.category, hit.doc_id, hit.score);
            println!("   {}", snippet(&hit.chunk_text, 200));
        }
    }
    Ok(())
}
