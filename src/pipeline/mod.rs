//! # Sentence → edges
//!
//! Sequential, per-sentence state machine:
//!
//! ```text
//! sentence ─▶ voice rewrite ─▶ alias normalisation ─▶ triple extraction
//!                                                        │
//!       edges ◀── encode ◀── allow-list ◀── predicate abstraction (per triple)
//! ```
//!
//! Nothing carries over between sentences except the shared resources
//! (shard cache, KB cell, predicate dictionary, projection) and the
//! observability counters in [`PipelineStats`].

pub mod stats;
pub mod tokenize;
pub mod voice;

use std::sync::Arc;

use crate::alias::{AliasResolver, AliasResources};
use crate::ann::AnnProvider;
use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::encoder::{HdEncoder, ProjectionMatrix};
use crate::extract::{LlmTripleExtractor, TripleExtractor, VerbPatternExtractor};
use crate::llm::CompletionClient;
use crate::model::{AliasTier, Edge, EdgeMeta, SentenceId, Triple};
use crate::predicate::{PredicateAbstractionResolver, PredicateDictionary};
use crate::retry::RetryPolicy;
use crate::{Error, Result};

pub use stats::{PipelineStats, StatsSnapshot};
pub use tokenize::{is_word, split_sentences, tokenize};
pub use voice::VoiceNormalizer;

/// A sentence after alias substitution, with its alias provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasedSentence {
    pub text: String,
    /// Lowest matching tier over all word tokens; `Fallback` if none matched.
    pub alias_tier: AliasTier,
    /// First entity id linked in the sentence.
    pub eid: Option<String>,
}

pub struct SentenceGraphPipeline {
    voice: VoiceNormalizer,
    aliases: Arc<AliasResources>,
    predicates: Arc<PredicateAbstractionResolver>,
    encoder: Arc<HdEncoder>,
    extractor: Arc<dyn TripleExtractor>,
    expected_abstracts: Vec<String>,
    stats: Arc<PipelineStats>,
}

impl SentenceGraphPipeline {
    pub fn builder(config: Config) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn predicates(&self) -> &PredicateAbstractionResolver {
        &self.predicates
    }

    pub fn encoder(&self) -> &HdEncoder {
        &self.encoder
    }

    pub fn expected_abstracts(&self) -> &[String] {
        &self.expected_abstracts
    }

    /// Resolver without document context (tier 1 off).
    pub fn alias_resolver(&self) -> AliasResolver {
        AliasResolver::new(Arc::clone(&self.aliases))
    }

    /// Resolver scoped to `text`; enables tier 1 when embeddings exist.
    pub fn document_resolver(&self, text: &str) -> AliasResolver {
        AliasResolver::for_document(Arc::clone(&self.aliases), text)
    }

    pub fn normalize_voice<'a>(&self, sentence: &'a str) -> std::borrow::Cow<'a, str> {
        self.voice.normalize(sentence)
    }

    /// Substitute every word token with its canonical form, keeping the
    /// separators verbatim.
    pub fn normalize_aliases(&self, resolver: &AliasResolver, text: &str) -> AliasedSentence {
        let mut out = String::with_capacity(text.len());
        let mut alias_tier = AliasTier::Fallback;
        let mut eid = None;

        for token in tokenize(text) {
            if !is_word(token) {
                out.push_str(token);
                continue;
            }
            let resolved = resolver.resolve(token);
            out.push_str(&resolved.canonical);
            if resolved.tier.is_match() {
                alias_tier = alias_tier.min(resolved.tier);
            }
            if eid.is_none() {
                eid = resolved.entity_id;
            }
        }
        AliasedSentence { text: out, alias_tier, eid }
    }

    pub fn extract(&self, sentence: &str, doc_id: &str, sent_id: SentenceId) -> Result<Vec<Edge>> {
        let mut trace = Vec::new();
        self.extract_with(&self.alias_resolver(), sentence, doc_id, sent_id, &mut trace)
    }

    pub fn extract_with_trace(
        &self,
        sentence: &str,
        doc_id: &str,
        sent_id: SentenceId,
        trace: &mut Vec<String>,
    ) -> Result<Vec<Edge>> {
        self.extract_with(&self.alias_resolver(), sentence, doc_id, sent_id, trace)
    }

    /// Full per-sentence run with a caller-chosen alias resolver.
    ///
    /// Fails when triple extraction exhausts its retries, when a new
    /// predicate mapping cannot be persisted, or when encoding fails.
    /// Allow-list rejections are not errors.
    pub fn extract_with(
        &self,
        resolver: &AliasResolver,
        sentence: &str,
        doc_id: &str,
        sent_id: SentenceId,
        trace: &mut Vec<String>,
    ) -> Result<Vec<Edge>> {
        let start = trace.len();
        let result = self.run(resolver, sentence, doc_id, sent_id, trace);
        for line in &trace[start..] {
            tracing::debug!(doc_id, %sent_id, "{line}");
        }
        result
    }

    fn run(
        &self,
        resolver: &AliasResolver,
        sentence: &str,
        doc_id: &str,
        sent_id: SentenceId,
        trace: &mut Vec<String>,
    ) -> Result<Vec<Edge>> {
        let active = self.voice.normalize(sentence);
        if active != sentence {
            trace.push(format!("passive -> active: {active}"));
        }

        let aliased = self.normalize_aliases(resolver, &active);
        trace.push(format!("alias tier={}", aliased.alias_tier));

        let triples = self.extractor.extract(&aliased.text)?;
        trace.push(format!("{} triple(s) extracted", triples.len()));

        let mut edges = Vec::with_capacity(triples.len());
        for triple in triples {
            if let Some(edge) = self.edge_from_triple(triple, &aliased, doc_id, sent_id, trace)? {
                self.stats.record_edge(&edge.edge_type, edge.meta.alias_tier);
                edges.push(edge);
            }
        }
        trace.push(format!("produced {} edge(s)", edges.len()));
        Ok(edges)
    }

    fn edge_from_triple(
        &self,
        triple: Triple,
        aliased: &AliasedSentence,
        doc_id: &str,
        sent_id: SentenceId,
        trace: &mut Vec<String>,
    ) -> Result<Option<Edge>> {
        let fine_pred = triple.predicate.to_lowercase();
        let pool = if self.expected_abstracts.is_empty() {
            self.predicates.known_abstracts()
        } else {
            self.expected_abstracts.clone()
        };

        let resolution = self.predicates.resolve_traced(&fine_pred, &pool, trace)?;
        trace.push(format!("abstract ({}) = {}", resolution.source, resolution.abstract_type));

        if !self.expected_abstracts.is_empty() && !self.expected_abstracts.contains(&resolution.abstract_type) {
            trace.push("skipped: abstract not in allow-list".into());
            self.stats.record_dropped();
            return Ok(None);
        }

        let encoded = self.encoder.encode(&triple.subject, &fine_pred, &triple.object)?;
        Ok(Some(Edge {
            edge_type: resolution.abstract_type.clone(),
            surface: encoded.surface,
            semantic: encoded.semantic,
            meta: EdgeMeta {
                fine_pred,
                abstract_type: resolution.abstract_type,
                source: resolution.source,
                subject: triple.subject,
                object: triple.object,
                eid: aliased.eid.clone(),
                alias_tier: aliased.alias_tier,
                doc_id: doc_id.to_string(),
                sent_id,
            },
        }))
    }
}

impl std::fmt::Debug for SentenceGraphPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceGraphPipeline")
            .field("capabilities", &self.aliases.capabilities)
            .field("encoder", &self.encoder)
            .field("predicates", &self.predicates)
            .field("expected_abstracts", &self.expected_abstracts)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Wires collaborators and process-wide resources into a pipeline.
///
/// Only the encoder's embedding provider is mandatory. Without a
/// completion client, predicate misses become new types directly; without
/// an explicit extractor, an LLM extractor is used when a client exists and
/// the verb-pattern extractor otherwise.
pub struct PipelineBuilder {
    config: Config,
    alias_embedder: Option<Arc<dyn EmbeddingProvider>>,
    ann: Option<Arc<dyn AnnProvider>>,
    encoder_embedder: Option<Arc<dyn EmbeddingProvider>>,
    completion: Option<Arc<dyn CompletionClient>>,
    extractor: Option<Arc<dyn TripleExtractor>>,
}

impl PipelineBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            alias_embedder: None,
            ann: None,
            encoder_embedder: None,
            completion: None,
            extractor: None,
        }
    }

    /// Embedding provider for alias tiers 1 and 2.
    pub fn alias_embeddings(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.alias_embedder = Some(embedder);
        self
    }

    pub fn ann(mut self, ann: Arc<dyn AnnProvider>) -> Self {
        self.ann = Some(ann);
        self
    }

    /// Base embedding model for the hypervector encoder.
    pub fn encoder_embeddings(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.encoder_embedder = Some(embedder);
        self
    }

    /// Same provider for the alias tiers and the encoder.
    pub fn embeddings(self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.alias_embeddings(Arc::clone(&embedder)).encoder_embeddings(embedder)
    }

    pub fn completion(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.completion = Some(client);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TripleExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn build(self) -> Result<SentenceGraphPipeline> {
        let config = self.config;
        config.validate()?;

        let encoder_embedder = self
            .encoder_embedder
            .ok_or_else(|| Error::Config("the encoder needs an embedding provider".into()))?;
        let retry = RetryPolicy::from(&config.retry);

        let projection = ProjectionMatrix::load_or_create(
            &config.projection_path(),
            config.dimension,
            encoder_embedder.dimension(),
            config.encoder.projection_seed,
        )?;
        let encoder = HdEncoder::new(encoder_embedder, Arc::new(projection), config.encoder.role_seed)?;

        let mut predicates = PredicateAbstractionResolver::new(PredicateDictionary::open(config.dictionary_path())?)
            .with_config(&config.predicate)
            .with_temperature(config.llm.temperature);
        if let Some(client) = &self.completion {
            predicates = predicates.with_classifier(Arc::clone(client), retry);
        }

        let extractor: Arc<dyn TripleExtractor> = match (self.extractor, &self.completion) {
            (Some(extractor), _) => extractor,
            (None, Some(client)) => {
                Arc::new(LlmTripleExtractor::new(Arc::clone(client), retry).with_temperature(config.llm.temperature))
            }
            (None, None) => Arc::new(VerbPatternExtractor::with_default_verbs()?),
        };

        let aliases = AliasResources::new(&config, self.alias_embedder, self.ann);
        tracing::info!(
            dimension = config.dimension,
            has_embeddings = aliases.capabilities.has_embeddings,
            has_ann = aliases.capabilities.has_ann,
            classifier = self.completion.is_some(),
            "sentence graph pipeline ready"
        );

        Ok(SentenceGraphPipeline {
            voice: VoiceNormalizer::new(&config.pipeline.passive_verbs)?,
            aliases: Arc::new(aliases),
            predicates: Arc::new(predicates),
            encoder: Arc::new(encoder),
            extractor,
            expected_abstracts: config.pipeline.expected_abstracts,
            stats: Arc::new(PipelineStats::default()),
        })
    }
}
