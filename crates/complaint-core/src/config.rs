//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nesting, e.g. `APP_RETRIEVAL__TOP_K=3`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment, env_name })
    }

    /// Extract and validate the typed settings for the active environment.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        settings.validate()?;
        validate_for_env(&settings, &self.env_name)?;
        Ok(settings)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }
}

fn validate_for_env(settings: &Settings, env: &str) -> Result<()> {
    match env {
        "prod" | "production" => {
            if settings.embedding.backend == EmbeddingBackend::Hash {
                return Err(Error::Configuration("the hash embedder is for dev/test only; use embedding.backend = \"bert\" in prod".into()));
            }
        }
        "dev" | "development" | "test" | "testing" => {}
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub index: IndexSettings,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub prompt: PromptSettings,
    pub generation: GenerationSettings,
}

impl Settings {
    /// Defaults overlaid with a TOML document; used by tests and embedders of the library.
    pub fn from_toml_str(toml: &str) -> anyhow::Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::string(toml))
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to parse settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.embedding.validate()?;
        if self.retrieval.top_k == 0 {
            return Err(Error::Configuration("retrieval.top_k must be at least 1".into()));
        }
        if self.prompt.max_context_chars == 0 {
            return Err(Error::Configuration("prompt.max_context_chars must be positive".into()));
        }
        // a full-size chunk must fit in the context on its own
        if self.prompt.max_context_chars < self.chunking.chunk_size {
            return Err(Error::Configuration(format!(
                "prompt.max_context_chars ({}) must be at least chunking.chunk_size ({})",
                self.prompt.max_context_chars, self.chunking.chunk_size
            )));
        }
        self.generation.config().validate()?;
        if self.generation.timeout_secs == 0 {
            return Err(Error::Configuration("generation.timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Expand and anchor every path setting at `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        self.corpus.path = resolve_with_base(base, &self.corpus.path).to_string_lossy().into_owned();
        self.index.dir = resolve_with_base(base, &self.index.dir).to_string_lossy().into_owned();
        self.embedding.model_dir = resolve_with_base(base, &self.embedding.model_dir).to_string_lossy().into_owned();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// A CSV file, or a directory searched recursively for `*.csv`.
    pub path: String,
}

impl Default for CorpusSettings {
    fn default() -> Self { Self { path: "data/processed/filtered_complaints.csv".into() } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub dir: String,
}

impl Default for IndexSettings {
    fn default() -> Self { Self { dir: "vector_store/lancedb".into() } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Bert,
    Hash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub model_dir: String,
    /// Output dimension of the hash backend; BERT reads it from the model config.
    pub dim: usize,
    pub max_len: usize,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Bert,
            model_dir: "models/all-MiniLM-L6-v2".into(),
            dim: 384,
            max_len: 256,
            batch_size: 64,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingSettings {
    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 || self.max_len == 0 {
            return Err(Error::Configuration("embedding.dim and embedding.max_len must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::Configuration("embedding.batch_size must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Configuration("embedding.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { top_k: 5 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub max_context_chars: usize,
}

impl Default for PromptSettings {
    fn default() -> Self { Self { max_context_chars: 4000 } }
}

/// Sampling knobs handed to a generator on every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self { Self { max_tokens: 128, temperature: 0.7, top_p: 0.8 } }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(Error::Configuration("generation.max_tokens must be at least 1".into()));
        }
        if !(self.temperature >= 0.0 && self.temperature.is_finite()) {
            return Err(Error::Configuration(format!("generation.temperature must be >= 0, got {}", self.temperature)));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(Error::Configuration(format!("generation.top_p must be in (0, 1], got {}", self.top_p)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        let sampling = GenerationConfig::default();
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            model: "local-model".into(),
            timeout_secs: 60,
            max_tokens: sampling.max_tokens,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
        }
    }
}

impl GenerationSettings {
    pub fn config(&self) -> GenerationConfig {
        GenerationConfig { max_tokens: self.max_tokens, temperature: self.temperature, top_p: self.top_p }
    }

    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = Settings::default();
        s.validate().expect("defaults validate");
        assert_eq!(s.chunking.chunk_size, 300);
        assert_eq!(s.chunking.chunk_overlap, 50);
        assert_eq!(s.generation.config(), GenerationConfig { max_tokens: 128, temperature: 0.7, top_p: 0.8 });
    }

    #[test]
    fn toml_overrides_nested_keys() {
        let s = Settings::from_toml_str("[retrieval]\ntop_k = 2\n[embedding]\nbackend = \"hash\"\ndim = 64\n").expect("parse");
        assert_eq!(s.retrieval.top_k, 2);
        assert_eq!(s.embedding.backend, EmbeddingBackend::Hash);
        assert_eq!(s.embedding.dim, 64);
        assert_eq!(s.prompt.max_context_chars, 4000);
    }

    #[test]
    fn overlap_not_below_size_is_rejected() {
        let err = Settings::from_toml_str("[chunking]\nchunk_size = 10\nchunk_overlap = 10\n").expect_err("invalid");
        assert!(err.to_string().contains("chunk_overlap"), "{err}");
    }

    #[test]
    fn context_budget_smaller_than_a_chunk_is_rejected() {
        let mut s = Settings::default();
        s.chunking.chunk_size = 300;
        s.prompt.max_context_chars = 100;
        match s.validate() {
            Err(Error::Configuration(msg)) => assert!(msg.contains("max_context_chars"), "{msg}"),
            other => panic!("expected configuration error, got {other:?}"),
        }
        s.prompt.max_context_chars = 300;
        s.validate().expect("budget equal to chunk size is fine");
    }

    #[test]
    fn top_p_out_of_range_is_a_configuration_error() {
        let cfg = GenerationConfig { top_p: 1.5, ..GenerationConfig::default() };
        assert!(matches!(cfg.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn prod_refuses_hash_backend() {
        let mut s = Settings::default();
        s.embedding.backend = EmbeddingBackend::Hash;
        assert!(validate_for_env(&s, "prod").is_err());
        assert!(validate_for_env(&s, "dev").is_ok());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let mut s = Settings::default();
        s.index.dir = "/abs/index".into();
        s.resolve_paths(Path::new("/srv/app"));
        assert_eq!(s.index.dir, "/abs/index");
        assert_eq!(PathBuf::from(&s.corpus.path), Path::new("/srv/app/data/processed/filtered_complaints.csv"));
    }
}
