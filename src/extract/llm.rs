//! LLM-backed extractor with a strict JSON-array contract.

use std::sync::Arc;

use serde_json::Value;

use super::TripleExtractor;
use crate::llm::{CompletionClient, CompletionRequest};
use crate::model::Triple;
use crate::retry::RetryPolicy;
use crate::{Error, Result};

const MAX_TOKENS: u32 = 256;

pub fn extraction_prompt(sentence: &str) -> String {
    format!(
        "Extract *all* (subject, predicate, object) tuples from the sentence as \
         strict JSON **array** with this exact schema:\n\
         [{{\"subject\": string, \"predicate\": string, \"object\": string}}, ...]\n\
         Return JSON array only, no commentary.\n\n{sentence}"
    )
}

pub struct LlmTripleExtractor {
    client: Arc<dyn CompletionClient>,
    retry: RetryPolicy,
    temperature: f32,
}

impl LlmTripleExtractor {
    pub fn new(client: Arc<dyn CompletionClient>, retry: RetryPolicy) -> Self {
        Self { client, retry, temperature: 0.0 }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl TripleExtractor for LlmTripleExtractor {
    fn extract(&self, sentence: &str) -> Result<Vec<Triple>> {
        let request = CompletionRequest::new(extraction_prompt(sentence))
            .max_tokens(MAX_TOKENS)
            .temperature(self.temperature)
            .json();

        self.retry
            .run("triple extraction", |_| {
                let raw = self.client.complete(&request)?;
                parse_triples(&raw)
            })
            .map_err(|e| Error::Extraction { attempts: self.retry.attempts(), message: e.to_string() })
    }
}

impl std::fmt::Debug for LlmTripleExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmTripleExtractor")
            .field("model", &self.client.model())
            .field("retry", &self.retry)
            .finish()
    }
}

/// Parse a completion into triples.
///
/// Accepted shapes: a JSON array, an array encoded as a JSON string, a
/// single triple object, or an object wrapping exactly one array field.
/// Items that are not objects with non-empty string `subject`,
/// `predicate` and `object` are skipped. Anything else is an error.
pub fn parse_triples(raw: &str) -> Result<Vec<Triple>> {
    let malformed = |why: &str| Error::MalformedResponse(format!("{why}: {raw:?}"));

    let mut value: Value = serde_json::from_str(strip_fences(raw)).map_err(|_| malformed("not JSON"))?;
    if let Value::String(inner) = &value {
        value = serde_json::from_str(inner).map_err(|_| malformed("string is not JSON"))?;
    }

    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) if map.contains_key("subject") => vec![Value::Object(map)],
        Value::Object(map) => {
            let mut arrays = map.into_iter().filter_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            });
            match (arrays.next(), arrays.next()) {
                (Some(items), None) => items,
                _ => return Err(malformed("object without a single triple array")),
            }
        }
        _ => return Err(malformed("not a list of triples")),
    };

    Ok(items.iter().filter_map(triple_from_value).collect())
}

fn triple_from_value(item: &Value) -> Option<Triple> {
    let field = |name: &str| item.get(name).and_then(Value::as_str);
    Triple::new(field("subject")?, field("predicate")?, field("object")?).ok()
}

fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
