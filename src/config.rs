//! TOML configuration.
//!
//! Every section is optional; missing keys take the defaults listed in
//! `mdh.example.toml`. [`load_config`] parses and validates a file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::chunk::DEFAULT_MAX_CHUNK_SIZE;
use crate::search::{SearchOptions, Strategy};
use crate::snippet::DEFAULT_CONTEXT_LINES;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.md".to_string(),
        "**/*.markdown".to_string(),
        "**/*.txt".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
        }
    }
}

fn default_max_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_SIZE
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f64,
    #[serde(default = "default_text_weight")]
    pub text_weight: f64,
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            max_results: default_max_results(),
            vector_weight: default_vector_weight(),
            text_weight: default_text_weight(),
            context_lines: default_context_lines(),
        }
    }
}

impl RetrievalConfig {
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            max_results: self.max_results,
            vector_weight: self.vector_weight,
            text_weight: self.text_weight,
            context_lines: self.context_lines,
        }
    }
}

fn default_max_results() -> usize {
    5
}
fn default_vector_weight() -> f64 {
    0.7
}
fn default_text_weight() -> f64 {
    0.3
}
fn default_context_lines() -> usize {
    DEFAULT_CONTEXT_LINES
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    /// Cache file location; relative paths resolve against `corpus.root`.
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            url: None,
            cache_file: default_cache_file(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_cache_file() -> PathBuf {
    PathBuf::from(".md-harness-embeddings.json")
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// Defaults rooted at the current directory, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Absolute-or-root-relative location of the embedding cache.
    pub fn cache_path(&self) -> PathBuf {
        if self.embedding.cache_file.is_absolute() {
            self.embedding.cache_file.clone()
        } else {
            self.corpus.root.join(&self.embedding.cache_file)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chunk_size == 0 {
            bail!("chunking.max_chunk_size must be > 0");
        }

        if self.retrieval.max_results < 1 {
            bail!("retrieval.max_results must be >= 1");
        }

        for (name, weight) in [
            ("vector_weight", self.retrieval.vector_weight),
            ("text_weight", self.retrieval.text_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                bail!("retrieval.{} must be a finite number >= 0", name);
            }
        }

        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }

        match self.embedding.provider.as_str() {
            "disabled" | "local" | "openai" | "ollama" => {}
            other => bail!(
                "Unknown embedding provider: '{}'. Must be disabled, local, openai, or ollama.",
                other
            ),
        }

        if matches!(self.embedding.provider.as_str(), "openai" | "ollama") {
            if self.embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    self.embedding.provider
                );
            }
            if self.embedding.dims.is_none() || self.embedding.dims == Some(0) {
                bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    self.embedding.provider
                );
            }
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.chunking.max_chunk_size, 1000);
        assert_eq!(config.retrieval.strategy, Strategy::Keyword);
        assert_eq!(config.retrieval.max_results, 5);
        assert!((config.retrieval.vector_weight - 0.7).abs() < 1e-9);
        assert!((config.retrieval.text_weight - 0.3).abs() < 1e-9);
        assert_eq!(config.retrieval.context_lines, 2);
        assert!(!config.embedding.is_enabled());
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
[corpus]
root = "/srv/docs"
exclude_globs = ["drafts/**"]

[chunking]
max_chunk_size = 400

[retrieval]
strategy = "hybrid"
max_results = 10
vector_weight = 1.5
text_weight = 0.5

[embedding]
provider = "local"
model = "bge-small-en-v1.5"
"#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.retrieval.strategy, Strategy::Hybrid);
        assert_eq!(config.chunking.max_chunk_size, 400);
        assert_eq!(
            config.cache_path(),
            PathBuf::from("/srv/docs/.md-harness-embeddings.json")
        );
    }

    #[test]
    fn test_weights_need_not_sum_to_one() {
        let mut config = Config::minimal();
        config.retrieval.vector_weight = 2.0;
        config.retrieval.text_weight = 2.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut config = Config::minimal();
        config.chunking.max_chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::minimal();
        config.retrieval.text_weight = -0.1;
        assert!(config.validate().is_err());

        let mut config = Config::minimal();
        config.embedding.provider = "magic".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::minimal();
        config.embedding.provider = "openai".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_strategy_rejected_at_parse() {
        let parsed: Result<Config, _> = toml::from_str("[retrieval]\nstrategy = \"fuzzy\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config(Path::new("/nonexistent/mdh.toml")).is_err());
    }
}
