//! # sentence-graph — sentences in, knowledge-graph edges out
//!
//! Every sentence is rewritten to active voice, alias-normalised through a
//! tiered resolver, split into triples, and each triple becomes an edge
//! with an abstract type and two hyperdimensional vectors.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: embeddings, ANN search, completion, triple extraction
//!    and graph storage are traits; bundled implementations are swappable
//! 2. **Explicit resources**: shard cache, KB index, predicate dictionary and
//!    projection matrix are handles built once by [`PipelineBuilder`]
//! 3. **Degrade, don't fail**: a missing optional collaborator switches off
//!    its alias tier; only data-integrity problems reach the caller
//! 4. **Reproducible vectors**: role vectors and projection are seeded, so
//!    identical input always encodes identically
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sentence_graph::{Config, HashingEmbedder, SentenceGraph, SentenceGraphPipeline};
//!
//! # fn example() -> sentence_graph::Result<()> {
//! let pipeline = SentenceGraphPipeline::builder(Config::with_resources("resources"))
//!     .encoder_embeddings(Arc::new(HashingEmbedder::default()))
//!     .build()?;
//! let graph = SentenceGraph::in_memory(pipeline);
//!
//! let report = graph.ingest_document("doc-1", "Acme was founded by Jane Doe. Globex acquired Initech.")?;
//! for edge in graph.get_doc_graph("doc-1")? {
//!     println!("{} -[{}]-> {}", edge.meta.subject, edge.edge_type, edge.meta.object);
//! }
//! # let _ = report;
//! # Ok(())
//! # }
//! ```
//!
//! ## Collaborators
//!
//! | Concern | Trait | Bundled |
//! |---------|-------|---------|
//! | Embeddings | `EmbeddingProvider` | `HashingEmbedder`, `ApiEmbedder` (`http`) |
//! | Nearest neighbour | `AnnProvider` | `FlatIpProvider` |
//! | Completion | `CompletionClient` | `ChatCompletionsClient` (`http`) |
//! | Triples | `TripleExtractor` | `LlmTripleExtractor`, `VerbPatternExtractor` |
//! | Storage | `GraphStore` | `MemoryGraphStore` |

// ============================================================================
// Modules
// ============================================================================

pub mod alias;
pub mod ann;
pub mod config;
pub mod embedding;
pub mod encoder;
pub mod export;
pub mod extract;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod predicate;
pub mod retry;
pub mod storage;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    AliasTier, Edge, EdgeMeta, Hypervector, Matrix, PermuteTag, PredicateSource,
    ResolutionResult, SentenceId, Triple,
};

// ============================================================================
// Re-exports: Components
// ============================================================================

pub use alias::{AliasResolver, AliasResources};
pub use ann::{AnnIndex, AnnProvider, FlatIpProvider};
pub use config::Config;
pub use embedding::{Capabilities, EmbeddingProvider, HashingEmbedder};
pub use encoder::{EncodedEdge, HdEncoder, ProjectionMatrix};
pub use extract::{LlmTripleExtractor, TripleExtractor, VerbPatternExtractor};
pub use llm::{CompletionClient, CompletionRequest};
pub use pipeline::{PipelineBuilder, PipelineStats, SentenceGraphPipeline, StatsSnapshot};
pub use predicate::{PredicateAbstractionResolver, PredicateDictionary, PredicateResolution};
pub use retry::RetryPolicy;
pub use storage::{GraphStore, MemoryGraphStore};

#[cfg(feature = "http")]
pub use embedding::ApiEmbedder;
#[cfg(feature = "http")]
pub use llm::ChatCompletionsClient;

// ============================================================================
// Top-level SentenceGraph handle
// ============================================================================

use serde::Serialize;

/// The primary entry point: a pipeline plus the store its edges land in.
pub struct SentenceGraph<S: GraphStore = MemoryGraphStore> {
    pipeline: SentenceGraphPipeline,
    store: S,
}

/// Outcome of [`SentenceGraph::ingest_document`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub doc_id: String,
    /// Sentences stored.
    pub sentences: usize,
    pub edges: usize,
    /// Sentences skipped because extraction failed.
    pub failures: Vec<SentenceFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceFailure {
    pub sent_id: SentenceId,
    pub text: String,
    pub error: String,
}

impl<S: GraphStore> SentenceGraph<S> {
    pub fn new(pipeline: SentenceGraphPipeline, store: S) -> Self {
        Self { pipeline, store }
    }

    pub fn pipeline(&self) -> &SentenceGraphPipeline {
        &self.pipeline
    }

    /// Access the underlying store (for advanced use).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Extract and store one sentence without document context.
    /// Returns the number of edges stored.
    pub fn ingest_sentence(&self, doc_id: &str, sent_id: impl Into<SentenceId>, text: &str) -> Result<usize> {
        self.store.add_sentence(doc_id, sent_id.into(), text, |text, doc_id, sent_id| {
            self.pipeline.extract(text, doc_id, sent_id)
        })
    }

    /// Split `text` into sentences and store each under ids `0, 1, …`.
    ///
    /// The document-scoped alias resolver is built once up front. A
    /// sentence whose extraction fails is reported and skipped; a failed
    /// predicate-dictionary flush aborts the whole call.
    pub fn ingest_document(&self, doc_id: &str, text: &str) -> Result<DocumentReport> {
        let resolver = self.pipeline.document_resolver(text);
        let mut report = DocumentReport { doc_id: doc_id.to_string(), ..Default::default() };

        for (i, sentence) in pipeline::split_sentences(text).into_iter().enumerate() {
            let sent_id = SentenceId(i as u64);
            let stored = self.store.add_sentence(doc_id, sent_id, sentence, |text, doc_id, sent_id| {
                let mut trace = Vec::new();
                self.pipeline.extract_with(&resolver, text, doc_id, sent_id, &mut trace)
            });
            match stored {
                Ok(edges) => {
                    report.sentences += 1;
                    report.edges += edges;
                }
                Err(e @ Error::Persistence { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(doc_id, %sent_id, error = %e, "sentence skipped");
                    report.failures.push(SentenceFailure {
                        sent_id,
                        text: sentence.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            doc_id,
            sentences = report.sentences,
            edges = report.edges,
            failures = report.failures.len(),
            "document ingested"
        );
        Ok(report)
    }

    pub fn get_sentence_graph(&self, doc_id: &str, sent_id: impl Into<SentenceId>) -> Result<Vec<Edge>> {
        self.store.get_sentence_graph(doc_id, sent_id.into())
    }

    pub fn get_doc_graph(&self, doc_id: &str) -> Result<Vec<Edge>> {
        self.store.get_doc_graph(doc_id)
    }

    pub fn export_cypher(&self, doc_id: &str, writer: &mut dyn std::io::Write) -> Result<()> {
        export::export_cypher(&self.store, doc_id, writer)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.pipeline.stats().snapshot()
    }
}

/// In-memory graph for testing and embedding.
impl SentenceGraph<MemoryGraphStore> {
    pub fn in_memory(pipeline: SentenceGraphPipeline) -> Self {
        Self::new(pipeline, MemoryGraphStore::new())
    }
}

impl<S: GraphStore + std::fmt::Debug> std::fmt::Debug for SentenceGraph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceGraph")
            .field("pipeline", &self.pipeline)
            .field("store", &self.store)
            .finish()
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Completion service error: {0}")]
    Completion(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Triple extraction failed after {attempts} attempt(s): {message}")]
    Extraction { attempts: u32, message: String },

    #[error("Cannot persist {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("Corrupt resource {path}: {message}")]
    CorruptResource { path: String, message: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Invalid triple: {0}")]
    InvalidTriple(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
