//! # Triple extraction
//!
//! Turns a (normalised) sentence into zero or more `(subject, predicate,
//! object)` triples. Extractors are plain text-in, triples-out: no side
//! effects, malformed candidates dropped silently.
//!
//! - [`LlmTripleExtractor`]: strict-JSON prompt against a completion service.
//! - [`VerbPatternExtractor`]: offline rule-based matcher for known verbs.
//! - any `Fn(&str) -> Result<Vec<Triple>>` closure.

pub mod llm;
pub mod pattern;

pub use llm::{LlmTripleExtractor, parse_triples};
pub use pattern::VerbPatternExtractor;

use crate::Result;
use crate::model::Triple;

pub trait TripleExtractor: Send + Sync {
    /// Triples in the order the extractor found them; possibly empty.
    fn extract(&self, sentence: &str) -> Result<Vec<Triple>>;
}

impl<F> TripleExtractor for F
where
    F: Fn(&str) -> Result<Vec<Triple>> + Send + Sync,
{
    fn extract(&self, sentence: &str) -> Result<Vec<Triple>> {
        self(sentence)
    }
}
