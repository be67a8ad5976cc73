//! Runtime configuration.
//!
//! Every section has a `Default` carrying the stock policy values, so an
//! empty JSON object (`{}`) is a complete configuration. Thresholds and the
//! passive-voice verb list are policy knobs, not invariants.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable naming the resources directory.
pub const ENV_RESOURCES: &str = "SENTENCE_GRAPH_RESOURCES";
/// Environment variable overriding the hypervector dimension.
pub const ENV_DIMENSION: &str = "SENTENCE_GRAPH_DIMENSION";
/// Environment variable overriding the completion model name.
pub const ENV_LLM_MODEL: &str = "SENTENCE_GRAPH_LLM_MODEL";
/// Environment variable overriding the completion service base URL.
pub const ENV_LLM_BASE_URL: &str = "SENTENCE_GRAPH_LLM_BASE_URL";

// ============================================================================
// Top level
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root for shard files, KB files, projection matrix and predicate dictionary.
    pub resources_dir: PathBuf,
    /// Hypervector dimension D.
    pub dimension: usize,
    pub alias: AliasConfig,
    pub predicate: PredicateConfig,
    pub encoder: EncoderConfig,
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resources_dir: PathBuf::from("resources"),
            dimension: 4096,
            alias: AliasConfig::default(),
            predicate: PredicateConfig::default(),
            encoder: EncoderConfig::default(),
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Defaults rooted at the given resources directory.
    pub fn with_resources(dir: impl Into<PathBuf>) -> Self {
        Self { resources_dir: dir.into(), ..Self::default() }
    }

    /// Read a JSON config file. Missing sections fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides. `lookup` is usually `|k| std::env::var(k).ok()`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_RESOURCES) {
            self.resources_dir = PathBuf::from(dir);
        }
        if let Some(dim) = lookup(ENV_DIMENSION) {
            self.dimension = dim
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_DIMENSION}={dim} is not an integer")))?;
        }
        if let Some(model) = lookup(ENV_LLM_MODEL) {
            self.llm.model = model;
        }
        if let Some(url) = lookup(ENV_LLM_BASE_URL) {
            self.llm.base_url = url;
        }
        self.validate()?;
        Ok(self)
    }

    /// Defaults plus process environment.
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env(|k| std::env::var(k).ok())
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::Config("dimension must be positive".into()));
        }
        for (name, value) in [
            ("alias.fuzzy_threshold", self.alias.fuzzy_threshold),
            ("alias.kb_threshold", self.alias.kb_threshold),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{name}={value} outside [-1, 1]")));
            }
        }
        if self.alias.max_span_words == 0 {
            return Err(Error::Config("alias.max_span_words must be positive".into()));
        }
        if self.retry.attempts == 0 {
            return Err(Error::Config("retry.attempts must be at least 1".into()));
        }
        if self.pipeline.passive_verbs.iter().any(|v| v.trim().is_empty()) {
            return Err(Error::Config("pipeline.passive_verbs contains an empty entry".into()));
        }
        Ok(())
    }

    pub fn shard_dir(&self) -> PathBuf {
        self.resources_dir.join(&self.alias.shard_dir)
    }

    pub fn kb_embeddings_path(&self) -> PathBuf {
        self.resources_dir.join(&self.alias.kb_embeddings_file)
    }

    pub fn kb_ids_path(&self) -> PathBuf {
        self.resources_dir.join(&self.alias.kb_ids_file)
    }

    pub fn projection_path(&self) -> PathBuf {
        self.resources_dir.join(&self.encoder.projection_file)
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.resources_dir.join(&self.predicate.dictionary_file)
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Alias cascade policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasConfig {
    /// Sub-directory of `resources_dir` holding `<xx>.tsv` shards.
    pub shard_dir: String,
    /// T1 accepts a span only when cosine is strictly above this.
    pub fuzzy_threshold: f32,
    /// T2 accepts a KB hit when similarity is at least this.
    pub kb_threshold: f32,
    /// Longest capitalised run indexed by T1.
    pub max_span_words: usize,
    pub kb_embeddings_file: String,
    pub kb_ids_file: String,
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            shard_dir: "aliases".into(),
            fuzzy_threshold: 0.85,
            kb_threshold: 0.6,
            max_span_words: 5,
            kb_embeddings_file: "kb_emb.bin".into(),
            kb_ids_file: "kb_ids.txt".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredicateConfig {
    pub dictionary_file: String,
    /// Extra fine → abstract pairs layered over the built-in seed table.
    pub extra_seeds: HashMap<String, String>,
    /// Completion budget for a classification reply.
    pub max_tokens: u32,
}

impl Default for PredicateConfig {
    fn default() -> Self {
        Self {
            dictionary_file: "edge_types.json".into(),
            extra_seeds: HashMap::new(),
            max_tokens: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub projection_file: String,
    pub projection_seed: u64,
    pub role_seed: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            projection_file: "projection.bin".into(),
            projection_seed: 42,
            role_seed: 42,
        }
    }
}

/// OpenAI-compatible completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the bearer token.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepinfra.com/v1/openai".into(),
            model: "mistralai/Mixtral-8x7B-Instruct-v0.1".into(),
            api_key_env: "DEEPINFRA_TOKEN".into(),
            timeout_secs: 30,
            temperature: 0.0,
        }
    }
}

/// Fixed-backoff retry budget for external calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { attempts: 3, backoff_ms: 1000 }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Verbs eligible for the "X was <verb> by Y" rewrite.
    pub passive_verbs: Vec<String>,
    /// Allow-list of abstract edge types; empty means unrestricted.
    pub expected_abstracts: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            passive_verbs: vec!["founded".into(), "acquired".into(), "located".into()],
            expected_abstracts: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.dimension, 4096);
        assert_eq!(config.alias.fuzzy_threshold, 0.85);
        assert_eq!(config.alias.kb_threshold, 0.6);
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.pipeline.passive_verbs.len(), 3);
        assert!(config.pipeline.expected_abstracts.is_empty());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"alias": {"fuzzy_threshold": 0.9}, "dimension": 512}"#).unwrap();
        assert_eq!(config.alias.fuzzy_threshold, 0.9);
        assert_eq!(config.alias.kb_threshold, 0.6);
        assert_eq!(config.dimension, 512);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .apply_env(|k| match k {
                ENV_RESOURCES => Some("/tmp/res".into()),
                ENV_DIMENSION => Some("1024".into()),
                ENV_LLM_MODEL => Some("tiny".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.resources_dir, PathBuf::from("/tmp/res"));
        assert_eq!(config.dimension, 1024);
        assert_eq!(config.llm.model, "tiny");
        assert_eq!(config.shard_dir(), PathBuf::from("/tmp/res/aliases"));
    }

    #[test]
    fn test_env_bad_dimension() {
        let result = Config::default().apply_env(|k| (k == ENV_DIMENSION).then(|| "wide".to_string()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.dimension = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.alias.kb_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pipeline.passive_verbs.push("  ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"pipeline": {"expected_abstracts": ["founded_by"]}}"#).unwrap();
        let config = Config::from_json_file(&path).unwrap();
        assert_eq!(config.pipeline.expected_abstracts, vec!["founded_by"]);
    }
}
