//! # Alias resolution cascade
//!
//! ```text
//! token ─▶ T0 exact shard ─▶ T1 in-document fuzzy ─▶ T2 global KB ─▶ fallback
//!            (always)          (embeddings + doc)     (embeddings + ANN)
//! ```
//!
//! The first tier that produces a match wins. A tier whose collaborator is
//! missing is skipped silently, so `resolve` never fails: the worst case is
//! the identity fallback `(token, None, -1)`.
//!
//! Shared resources (shard cache, KB cell) sit behind `Arc` in
//! [`AliasResources`], built once and handed to every resolver. A
//! document-scoped resolver adds a [`DocumentFuzzyIndex`] on top.

pub mod doc_index;
pub mod kb;
pub mod shards;

use std::sync::Arc;

use regex::Regex;

use crate::config::{AliasConfig, Config};
use crate::embedding::{Capabilities, EmbeddingProvider};
use crate::ann::AnnProvider;
use crate::model::ResolutionResult;

pub use doc_index::{DocumentFuzzyIndex, candidate_spans, span_pattern, spans_matching};
pub use kb::{GlobalEntityIndex, KbHit};
pub use shards::ShardedExactDictionary;

/// Process-wide alias resources, shared by every resolver.
pub struct AliasResources {
    pub exact: ShardedExactDictionary,
    pub global: GlobalEntityIndex,
    pub embedder: Option<Arc<dyn EmbeddingProvider>>,
    pub capabilities: Capabilities,
    pub policy: AliasConfig,
    /// Compiled once for every document-scoped resolver; `None` disables tier 1.
    pub span_pattern: Option<Regex>,
}

impl AliasResources {
    pub fn new(
        config: &Config,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        ann: Option<Arc<dyn AnnProvider>>,
    ) -> Self {
        let capabilities = Capabilities::detect(embedder.is_some(), ann.is_some());
        let global = GlobalEntityIndex::new(
            config.kb_embeddings_path(),
            config.kb_ids_path(),
            ann,
            embedder.clone(),
            config.alias.kb_threshold,
        );
        tracing::debug!(
            has_embeddings = capabilities.has_embeddings,
            has_ann = capabilities.has_ann,
            "alias capabilities detected"
        );
        let span_pattern = match span_pattern(config.alias.max_span_words) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(error = %e, "span pattern rejected; tier 1 off");
                None
            }
        };
        Self {
            exact: ShardedExactDictionary::new(config.shard_dir()),
            global,
            embedder,
            capabilities,
            policy: config.alias.clone(),
            span_pattern,
        }
    }
}

/// Resolves tokens to canonical forms. Cheap to clone.
#[derive(Clone)]
pub struct AliasResolver {
    resources: Arc<AliasResources>,
    document: Option<Arc<DocumentFuzzyIndex>>,
}

impl AliasResolver {
    /// Resolver with no document context (tier 1 inactive).
    pub fn new(resources: Arc<AliasResources>) -> Self {
        Self { resources, document: None }
    }

    /// Resolver scoped to one document. The fuzzy index is built here, once.
    /// Without an embedding provider this is the same as [`AliasResolver::new`];
    /// an embedding failure while indexing is logged and leaves tier 1 off.
    pub fn for_document(resources: Arc<AliasResources>, text: &str) -> Self {
        let document = resources.embedder.as_ref().zip(resources.span_pattern.as_ref()).and_then(|(embedder, pattern)| {
            match DocumentFuzzyIndex::build(text, embedder, pattern) {
                Ok(index) => Some(Arc::new(index)),
                Err(e) => {
                    tracing::warn!(error = %e, "document fuzzy index build failed; tier 1 off");
                    None
                }
            }
        });
        Self { resources, document }
    }

    pub fn resources(&self) -> &Arc<AliasResources> {
        &self.resources
    }

    pub fn has_document_context(&self) -> bool {
        self.document.is_some()
    }

    pub fn resolve(&self, token: &str) -> ResolutionResult {
        if let Some(canonical) = self.resources.exact.lookup(token) {
            return ResolutionResult::exact(canonical);
        }
        if let Some(span) = self.fuzzy(token) {
            return ResolutionResult::fuzzy(span);
        }
        if self.resources.capabilities.global_enabled() {
            if let Some(hit) = self.resources.global.link(token) {
                return ResolutionResult::global(token, hit.entity_id);
            }
        }
        ResolutionResult::unresolved(token)
    }

    fn fuzzy(&self, token: &str) -> Option<String> {
        if !self.resources.capabilities.fuzzy_enabled() {
            return None;
        }
        let (document, embedder) = (self.document.as_ref()?, self.resources.embedder.as_ref()?);
        if document.is_empty() {
            return None;
        }
        let query = match embedder.embed(token) {
            Ok(q) => q,
            Err(e) => {
                tracing::warn!(token, error = %e, "fuzzy query embedding failed");
                return None;
            }
        };
        let (span, score) = document.best_match(&query)?;
        (score > self.resources.policy.fuzzy_threshold).then(|| span.to_string())
    }
}

impl std::fmt::Debug for AliasResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasResolver")
            .field("capabilities", &self.resources.capabilities)
            .field("document", &self.document)
            .finish()
    }
}
