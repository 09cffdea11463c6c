use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::application::{EmbeddingProfile, Prompts, RagConfig, SamplingParams};
use crate::domain::{ChunkingPolicy, Normalization};
use crate::infrastructure::template::ChatTemplateKind;

/// Environment variable naming the YAML config file.
pub const CONFIG_PATH_VAR: &str = "LOCAL_RAG_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rag: RagConfig,
    pub chunking: ChunkingPolicy,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub prompts: Prompts,
    pub server: ServerConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    #[serde(rename = "openai")]
    OpenAi,
    /// Offline feature hashing, no network access.
    #[default]
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub query_prefix: String,
    pub passage_prefix: String,
    pub normalization: Normalization,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            query_prefix: String::new(),
            passage_prefix: String::new(),
            normalization: Normalization::default(),
        }
    }
}

impl EmbeddingConfig {
    pub fn profile(&self) -> EmbeddingProfile {
        EmbeddingProfile {
            query_prefix: self.query_prefix.clone(),
            passage_prefix: self.passage_prefix.clone(),
            normalization: self.normalization,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// ONNX causal language model. Unset serves retrieval only.
    pub model_path: Option<PathBuf>,
    /// Defaults to `tokenizer.json` beside the model.
    pub tokenizer_path: Option<PathBuf>,
    pub context_size: usize,
    /// Vocabulary entries that end a reply.
    pub end_tokens: Vec<String>,
    pub min_p: f32,
    pub temperature: f32,
    pub seed: Option<u64>,
    pub chat_template: ChatTemplateKind,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let sampling = SamplingParams::default();
        Self {
            model_path: None,
            tokenizer_path: None,
            context_size: 2048,
            end_tokens: ["<|im_end|>", "<|eot_id|>", "<|endoftext|>", "</s>"]
                .map(String::from)
                .to_vec(),
            min_p: sampling.min_p,
            temperature: sampling.temperature,
            seed: sampling.seed,
            chat_template: ChatTemplateKind::default(),
        }
    }
}

impl GenerationConfig {
    pub fn tokenizer_path(&self) -> PathBuf {
        match (&self.tokenizer_path, &self.model_path) {
            (Some(path), _) => path.clone(),
            (None, Some(model)) => model.with_file_name("tokenizer.json"),
            (None, None) => PathBuf::from("tokenizer.json"),
        }
    }

    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            min_p: self.min_p,
            temperature: self.temperature,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub index: PathBuf,
    pub docs: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            index: PathBuf::from("index.tsv"),
            docs: PathBuf::from("docs"),
        }
    }
}

impl AppConfig {
    /// File named by `LOCAL_RAG_CONFIG` (or `config.yaml`), then process
    /// environment overrides, then validation. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::from_file_or_default(path)?;
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Applies `LOCAL_RAG_*` and `SERVER_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("LOCAL_RAG_INDEX_PATH") {
            self.paths.index = PathBuf::from(path);
        }
        if let Some(path) = lookup("LOCAL_RAG_DOCS_PATH") {
            self.paths.docs = PathBuf::from(path);
        }
        if let Some(value) = lookup("LOCAL_RAG_TOP_K") {
            self.rag.top_k = parse_var("LOCAL_RAG_TOP_K", value)?;
        }
        if let Some(value) = lookup("LOCAL_RAG_CONTEXT_BUDGET") {
            self.rag.context_budget = parse_var("LOCAL_RAG_CONTEXT_BUDGET", value)?;
        }
        if let Some(path) = lookup("LOCAL_RAG_MODEL_PATH") {
            self.generation.model_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("LOCAL_RAG_TOKENIZER_PATH") {
            self.generation.tokenizer_path = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("LOCAL_RAG_CONTEXT_SIZE") {
            self.generation.context_size = parse_var("LOCAL_RAG_CONTEXT_SIZE", value)?;
        }
        if let Some(value) = lookup("LOCAL_RAG_MIN_SCORE") {
            self.rag.min_score_keep = Some(parse_var("LOCAL_RAG_MIN_SCORE", value)?);
        }
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(value) = lookup("SERVER_PORT") {
            self.server.port = parse_var("SERVER_PORT", value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.top_k == 0 {
            return Err(ConfigError::Invalid("rag.top_k must be greater than zero".into()));
        }
        if self.rag.context_budget == 0 {
            return Err(ConfigError::Invalid(
                "rag.context_budget must be greater than zero".into(),
            ));
        }
        if self.chunking.max_words == 0 {
            return Err(ConfigError::Invalid(
                "chunking.max_words must be greater than zero".into(),
            ));
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedding.dimension must be greater than zero".into(),
            ));
        }
        if self.generation.context_size == 0 {
            return Err(ConfigError::Invalid(
                "generation.context_size must be greater than zero".into(),
            ));
        }
        if self.generation.model_path.is_some() && self.generation.end_tokens.is_empty() {
            return Err(ConfigError::Invalid(
                "generation.end_tokens must name at least one token".into(),
            ));
        }
        if self.generation.temperature.is_nan() || self.generation.temperature < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "generation.temperature ({}) must not be negative",
                self.generation.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.generation.min_p) {
            return Err(ConfigError::Invalid(format!(
                "generation.min_p ({}) must be within [0, 1]",
                self.generation.min_p
            )));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::Env {
                var: "SERVER_HOST",
                value: self.server.host.clone(),
            })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.rag.top_k, 8);
        assert_eq!(config.rag.context_budget, 3500);
        assert_eq!(config.chunking.max_words, 1000);
        assert_eq!(config.chunking.overlap, 80);
        assert_eq!(config.embedding.provider, EmbeddingProvider::Hashing);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml(
            r#"
rag:
  top_k: 3
embedding:
  provider: openai
  dimension: 384
  query_prefix: "query: "
  normalization: none
generation:
  temperature: 0.0
  chat_template: llama3
"#,
        )
        .unwrap();

        assert_eq!(config.rag.top_k, 3);
        assert_eq!(config.rag.context_budget, 3500);
        assert_eq!(config.embedding.provider, EmbeddingProvider::OpenAi);
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.embedding.profile().query_prefix, "query: ");
        assert_eq!(config.embedding.normalization, Normalization::None);
        assert_eq!(config.generation.chat_template, ChatTemplateKind::Llama3);
        assert_eq!(config.generation.sampling().temperature, 0.0);
        assert_eq!(config.generation.sampling().min_p, 0.05);
        assert!(config.generation.model_path.is_none());
        assert_eq!(config.generation.context_size, 2048);
    }

    #[test]
    fn test_generation_model_settings() {
        let config = AppConfig::from_yaml(
            r#"
generation:
  model_path: models/qwen/model.onnx
  context_size: 4096
  end_tokens: ["<|im_end|>"]
  seed: 7
"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(
            config.generation.model_path,
            Some(PathBuf::from("models/qwen/model.onnx"))
        );
        assert_eq!(
            config.generation.tokenizer_path(),
            PathBuf::from("models/qwen/tokenizer.json")
        );
        assert_eq!(config.generation.context_size, 4096);
        assert_eq!(config.generation.end_tokens, vec!["<|im_end|>".to_string()]);
        assert_eq!(config.generation.sampling().seed, Some(7));

        let mut config = config;
        config
            .apply_overrides(lookup(&[
                ("LOCAL_RAG_TOKENIZER_PATH", "/opt/tok.json"),
                ("LOCAL_RAG_CONTEXT_SIZE", "1024"),
            ]))
            .unwrap();
        assert_eq!(config.generation.tokenizer_path(), PathBuf::from("/opt/tok.json"));
        assert_eq!(config.generation.context_size, 1024);

        config.generation.end_tokens.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup(&[
                ("LOCAL_RAG_INDEX_PATH", "/tmp/idx.tsv"),
                ("LOCAL_RAG_TOP_K", " 4 "),
                ("LOCAL_RAG_MIN_SCORE", "0.25"),
                ("SERVER_PORT", "9000"),
            ]))
            .unwrap();

        assert_eq!(config.paths.index, PathBuf::from("/tmp/idx.tsv"));
        assert_eq!(config.paths.docs, PathBuf::from("docs"));
        assert_eq!(config.rag.top_k, 4);
        assert_eq!(config.rag.min_score_keep, Some(0.25));
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(lookup(&[("LOCAL_RAG_TOP_K", "many")]))
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Env {
                var: "LOCAL_RAG_TOP_K",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.rag.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.generation.min_p = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.generation.temperature = -0.1;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.chunking.max_words = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.generation.context_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::from_file_or_default(dir.path().join("none.yaml")).unwrap();

        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_socket_addr() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".into();

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");

        config.server.host = "not-an-ip".into();
        assert!(config.socket_addr().is_err());
    }
}
