use std::sync::Arc;
use std::time::{Duration, Instant};

use complaint_core::config::{GenerationConfig, Settings};
use complaint_core::traits::{Embedder, Generator, VectorIndex};
use complaint_core::types::{Answer, Prompt};
use complaint_core::{Error, Result};

use crate::prompt::PromptAssembler;
use crate::retriever::Retriever;

/// Query-phase knobs, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub max_context_chars: usize,
    pub generation: GenerationConfig,
    pub embed_timeout: Duration,
    pub generation_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self { Self::from_settings(&Settings::default()) }
}

impl PipelineSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            top_k: settings.retrieval.top_k,
            max_context_chars: settings.prompt.max_context_chars,
            generation: settings.generation.config(),
            embed_timeout: settings.embedding.timeout(),
            generation_timeout: settings.generation.timeout(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::Configuration("top_k must be at least 1".into()));
        }
        if self.max_context_chars == 0 {
            return Err(Error::Configuration("max_context_chars must be positive".into()));
        }
        if self.embed_timeout.is_zero() || self.generation_timeout.is_zero() {
            return Err(Error::Configuration("timeouts must be positive".into()));
        }
        self.generation.validate()
    }
}

/// Retrieve, assemble, generate.
///
/// Holds only shared read-only handles, so one pipeline can serve
/// concurrent `ask` calls.
pub struct RagPipeline {
    retriever: Retriever,
    assembler: PromptAssembler,
    generator: Arc<dyn Generator>,
    settings: PipelineSettings,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
        settings: PipelineSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let retriever = Retriever::new(embedder, index, settings.embed_timeout)?;
        Ok(Self { retriever, assembler: PromptAssembler::new(), generator, settings })
    }

    pub fn settings(&self) -> &PipelineSettings { &self.settings }

    pub async fn ask(&self, question: &str) -> Result<Answer> {
        self.ask_with_prompt(question).await.map(|(answer, _)| answer)
    }

    /// Same as `ask`.
    pub async fn run(&self, question: &str) -> Result<Answer> {
        self.ask(question).await
    }

    /// Answer a question and also return the prompt that produced it.
    pub async fn ask_with_prompt(&self, question: &str) -> Result<(Answer, Prompt)> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("question must not be empty".into()));
        }
        let start = Instant::now();

        let retrieval = self.retriever.retrieve(trimmed, self.settings.top_k).await?;
        let prompt = self.assembler.assemble(&retrieval, trimmed, self.settings.max_context_chars);
        if !prompt.has_context() {
            tracing::info!("no context retrieved; generating without excerpts");
        }

        let after = self.settings.generation_timeout;
        let answer_text = tokio::time::timeout(after, self.generator.generate(&prompt, &self.settings.generation))
            .await
            .map_err(|_| Error::Timeout { stage: "generation", after })?
            .map_err(|e| Error::generation(format!("{e:#}")))?;
        if answer_text.trim().is_empty() {
            return Err(Error::generation(format!("{} returned an empty answer", self.generator.name())));
        }

        tracing::info!(elapsed = ?start.elapsed(), sources = retrieval.len(), in_context = prompt.included, generator = self.generator.name(), "answered");
        Ok((Answer { question: question.to_string(), answer_text, sources: retrieval.hits }, prompt))
    }
}
