//! Question answering over indexed complaint narratives.
//!
//! The build phase (`build_index`) chunks, embeds and stores a corpus; the
//! query phase (`RagPipeline::ask`) retrieves the closest chunks, assembles a
//! grounding prompt and asks a generator for the answer.

pub mod build;
pub mod embedding;
pub mod generator;
pub mod pipeline;
pub mod prompt;
pub mod retriever;

pub use build::{build_index, BuildOptions, BuildReport};
pub use generator::OpenAiCompatGenerator;
pub use pipeline::{PipelineSettings, RagPipeline};
pub use prompt::PromptAssembler;
pub use retriever::Retriever;
