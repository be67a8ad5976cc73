//! # Predicate abstraction
//!
//! Maps a free-text predicate onto an abstract edge type in two passes:
//!
//! ```text
//! pass A:  seed table ─▶ persistent dictionary          (read-only, source 'A')
//! pass B:  completion service ─▶ merge + flush          (source 'B')
//!              │
//!              └─ failure / malformed reply ─▶ predicate itself as a new type
//! ```
//!
//! The seed layer is immutable and always wins. The persistent layer is the
//! write-through [`PredicateDictionary`]; only pass B writes to it.

pub mod dictionary;
pub mod prompt;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::PredicateConfig;
use crate::llm::{CompletionClient, CompletionRequest};
use crate::model::PredicateSource;
use crate::retry::RetryPolicy;
use crate::{Error, Result};

pub use dictionary::PredicateDictionary;
pub use prompt::{ClassifierReply, classification_prompt, parse_reply};

/// Hand-curated fine → abstract pairs.
const BUILTIN_SEEDS: &[(&str, &str)] = &[
    ("located", "located_in"),
    ("located_in", "located_in"),
    ("founded", "founded_by"),
    ("founded_by", "founded_by"),
    ("acquired", "acquired_by"),
    ("acquired_by", "acquired_by"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateResolution {
    pub abstract_type: String,
    /// True iff this call introduced a type name nobody knew before.
    pub created: bool,
    pub source: PredicateSource,
}

impl PredicateResolution {
    fn from_dictionary(abstract_type: impl Into<String>) -> Self {
        Self { abstract_type: abstract_type.into(), created: false, source: PredicateSource::Dictionary }
    }
}

pub struct PredicateAbstractionResolver {
    seeds: BTreeMap<String, String>,
    dictionary: PredicateDictionary,
    classifier: Option<Arc<dyn CompletionClient>>,
    retry: RetryPolicy,
    max_tokens: u32,
    temperature: f32,
}

impl PredicateAbstractionResolver {
    /// Resolver over `dictionary` with the built-in seeds only and no
    /// classifier (every pass-B miss becomes a new type).
    pub fn new(dictionary: PredicateDictionary) -> Self {
        Self {
            seeds: BUILTIN_SEEDS.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            dictionary,
            classifier: None,
            retry: RetryPolicy::none(),
            max_tokens: 16,
            temperature: 0.0,
        }
    }

    /// Merge configured extra seeds over the built-ins and adopt the
    /// completion budget.
    pub fn with_config(mut self, config: &PredicateConfig) -> Self {
        for (fine, abstract_type) in &config.extra_seeds {
            self.seeds.insert(fine.to_lowercase(), abstract_type.clone());
        }
        self.max_tokens = config.max_tokens;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn CompletionClient>, retry: RetryPolicy) -> Self {
        self.classifier = Some(classifier);
        self.retry = retry;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn dictionary(&self) -> &PredicateDictionary {
        &self.dictionary
    }

    pub fn seeds(&self) -> &BTreeMap<String, String> {
        &self.seeds
    }

    /// Seed values plus persisted values, sorted and distinct.
    pub fn known_abstracts(&self) -> Vec<String> {
        let mut out: Vec<String> = self.seeds.values().cloned().collect();
        out.extend(self.dictionary.abstracts());
        out.sort();
        out.dedup();
        out
    }

    pub fn resolve(&self, predicate: &str, pool: &[String]) -> Result<PredicateResolution> {
        let mut trace = Vec::new();
        self.resolve_traced(predicate, pool, &mut trace)
    }

    /// Same as [`resolve`](Self::resolve), appending one line per branch
    /// taken to `trace`. Only a failed dictionary flush is an error.
    pub fn resolve_traced(
        &self,
        predicate: &str,
        pool: &[String],
        trace: &mut Vec<String>,
    ) -> Result<PredicateResolution> {
        let key = predicate.trim().to_lowercase();
        if key.is_empty() {
            return Err(Error::InvalidTriple("empty predicate".into()));
        }
        trace.push(format!("resolving '{predicate}'"));

        if let Some(abstract_type) = self.seeds.get(&key) {
            trace.push(format!("pass A seed hit -> {abstract_type}"));
            return Ok(PredicateResolution::from_dictionary(abstract_type.as_str()));
        }
        if let Some(abstract_type) = self.dictionary.get(&key) {
            trace.push(format!("pass A persistent hit -> {abstract_type}"));
            return Ok(PredicateResolution::from_dictionary(abstract_type));
        }

        let chosen = match self.classify(predicate.trim(), pool) {
            Some(reply) => {
                trace.push(match &reply {
                    ClassifierReply::New(name) => format!("pass B new -> {name}"),
                    ClassifierReply::Existing(name) => format!("pass B mapped -> {name}"),
                });
                reply.name().to_string()
            }
            None => {
                tracing::warn!(predicate = %key, "classification unavailable; predicate becomes its own type");
                trace.push(format!("pass B fallback -> {key}"));
                key.clone()
            }
        };

        let known = pool.iter().any(|p| *p == chosen)
            || self.seeds.values().any(|v| *v == chosen)
            || self.dictionary.has_abstract(&chosen);
        let stored = self.dictionary.get_or_insert(&key, &chosen)?;
        if stored != chosen {
            trace.push(format!("concurrent writer kept {key} -> {stored}"));
        }

        Ok(PredicateResolution {
            created: !known && stored == chosen,
            abstract_type: stored,
            source: PredicateSource::Classified,
        })
    }

    fn classify(&self, predicate: &str, pool: &[String]) -> Option<ClassifierReply> {
        let classifier = self.classifier.as_ref()?;
        let request = CompletionRequest::new(classification_prompt(predicate, pool))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature);

        let outcome = self.retry.run("predicate classification", |_| {
            let raw = classifier.complete(&request)?;
            parse_reply(&raw).ok_or_else(|| Error::MalformedResponse(format!("classifier reply {raw:?}")))
        });
        outcome.ok()
    }
}

impl std::fmt::Debug for PredicateAbstractionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateAbstractionResolver")
            .field("seeds", &self.seeds.len())
            .field("dictionary", &self.dictionary)
            .field("classifier", &self.classifier.as_ref().map(|c| c.model().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn replying(reply: &'static str) -> Arc<dyn CompletionClient> {
        Arc::new(move |_: &CompletionRequest| -> Result<String> { Ok(reply.to_string()) })
    }

    #[test]
    fn test_seed_hit() {
        let resolver = PredicateAbstractionResolver::new(PredicateDictionary::in_memory());
        let r = resolver.resolve("Founded", &[]).unwrap();
        assert_eq!(r, PredicateResolution::from_dictionary("founded_by"));
    }

    #[test]
    fn test_extra_seeds_merge() {
        let mut config = PredicateConfig::default();
        config.extra_seeds.insert("Bought".into(), "acquired_by".into());
        let resolver = PredicateAbstractionResolver::new(PredicateDictionary::in_memory()).with_config(&config);
        assert_eq!(resolver.resolve("bought", &[]).unwrap().abstract_type, "acquired_by");
        assert_eq!(resolver.resolve("located", &[]).unwrap().abstract_type, "located_in");
    }

    #[test]
    fn test_classifier_existing_type() {
        let resolver = PredicateAbstractionResolver::new(PredicateDictionary::in_memory())
            .with_classifier(replying("acquired_by"), RetryPolicy::none());
        let pool = resolver.known_abstracts();
        let r = resolver.resolve("purchased", &pool).unwrap();
        assert_eq!(r.abstract_type, "acquired_by");
        assert!(!r.created);
        assert_eq!(r.source, PredicateSource::Classified);
    }

    #[test]
    fn test_classifier_new_type_then_dictionary() {
        let resolver = PredicateAbstractionResolver::new(PredicateDictionary::in_memory())
            .with_classifier(replying("NEW: employs"), RetryPolicy::none());

        let first = resolver.resolve("hired", &[]).unwrap();
        assert_eq!(first.abstract_type, "employs");
        assert!(first.created);

        let second = resolver.resolve("hired", &[]).unwrap();
        assert_eq!(second, PredicateResolution::from_dictionary("employs"));
        assert!(resolver.known_abstracts().contains(&"employs".to_string()));
    }

    #[test]
    fn test_failing_classifier_falls_back_after_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let classifier: Arc<dyn CompletionClient> =
            Arc::new(move |_: &CompletionRequest| -> Result<String> {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::Completion("offline".into()))
            });
        let resolver = PredicateAbstractionResolver::new(PredicateDictionary::in_memory())
            .with_classifier(classifier, RetryPolicy::new(3, std::time::Duration::ZERO));

        let mut trace = Vec::new();
        let r = resolver.resolve_traced("Sponsored", &[], &mut trace).unwrap();
        assert_eq!(r.abstract_type, "sponsored");
        assert!(r.created);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(trace.last().unwrap().contains("fallback"));
    }

    #[test]
    fn test_malformed_reply_falls_back() {
        let resolver = PredicateAbstractionResolver::new(PredicateDictionary::in_memory())
            .with_classifier(replying("NEW:"), RetryPolicy::none());
        assert_eq!(resolver.resolve("mentored", &[]).unwrap().abstract_type, "mentored");
    }

    #[test]
    fn test_trace_records_branches() {
        let resolver = PredicateAbstractionResolver::new(PredicateDictionary::in_memory());
        let mut trace = Vec::new();
        resolver.resolve_traced("acquired", &[], &mut trace).unwrap();
        assert_eq!(trace, vec!["resolving 'acquired'", "pass A seed hit -> acquired_by"]);
    }

    #[test]
    fn test_empty_predicate_rejected() {
        let resolver = PredicateAbstractionResolver::new(PredicateDictionary::in_memory());
        assert!(matches!(resolver.resolve("  ", &[]), Err(Error::InvalidTriple(_))));
    }
}
