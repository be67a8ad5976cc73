//! OpenAI-compatible embedding endpoint (`POST {base_url}/embeddings`).

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingProvider, normalize};
use crate::retry::RetryPolicy;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ApiEmbedderConfig {
    pub base_url: String,
    pub model: String,
    /// Output width of `model`; checked against every response.
    pub dimension: usize,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for ApiEmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepinfra.com/v1/openai".into(),
            model: "sentence-transformers/all-MiniLM-L6-v2".into(),
            dimension: 384,
            api_key_env: "DEEPINFRA_TOKEN".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    encoding_format: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

pub struct ApiEmbedder {
    config: ApiEmbedderConfig,
    client: Client,
    api_key: String,
    retry: RetryPolicy,
}

impl ApiEmbedder {
    /// Fails when the API key variable is unset or empty.
    pub fn new(config: ApiEmbedderConfig, retry: RetryPolicy) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::Embedding(format!("API key not found in {}", config.api_key_env))
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Embedding(format!("failed to create HTTP client: {e}")))?;

        tracing::info!(model = %config.model, dimension = config.dimension, "API embedder initialized");

        Ok(Self { config, client, api_key, retry })
    }

    fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
        let body = EmbeddingRequest { model: &self.config.model, input: texts, encoding_format: "float" };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| Error::Embedding(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(Error::Embedding(format!("embedding API error ({status}): {text}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| Error::MalformedResponse(format!("embedding response: {e}")))?;
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);

        if data.len() != texts.len() {
            return Err(Error::MalformedResponse(format!(
                "asked for {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }

        data.into_iter()
            .map(|d| {
                let mut v = d.embedding;
                if v.len() != self.config.dimension {
                    return Err(Error::DimensionMismatch { expected: self.config.dimension, got: v.len() });
                }
                normalize(&mut v);
                Ok(v)
            })
            .collect()
    }
}

impl std::fmt::Debug for ApiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiEmbedder")
            .field("config", &self.config)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl EmbeddingProvider for ApiEmbedder {
    fn kind(&self) -> &str {
        "api"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text])?;
        batch.pop().ok_or_else(|| Error::MalformedResponse("empty embedding batch".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.retry.run("embeddings", |_| self.request(texts))
    }
}
