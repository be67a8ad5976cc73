//! # Text-completion service
//!
//! Predicate classification and LLM-backed triple extraction both talk to
//! a completion endpoint through [`CompletionClient`]. Callers own retries
//! (see [`RetryPolicy`](crate::retry::RetryPolicy)); a client makes one
//! attempt per call.

#[cfg(feature = "http")]
pub mod chat;

#[cfg(feature = "http")]
pub use chat::ChatCompletionsClient;

use crate::Result;

/// One prompt, one reply.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the service for a JSON-object response.
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), max_tokens: 256, temperature: 0.0, json_mode: false }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

pub trait CompletionClient: Send + Sync {
    /// Model identifier for logs.
    fn model(&self) -> &str;

    /// Raw reply text of the first choice.
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

impl<F> CompletionClient for F
where
    F: Fn(&CompletionRequest) -> Result<String> + Send + Sync,
{
    fn model(&self) -> &str {
        "fn"
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self(request)
    }
}
