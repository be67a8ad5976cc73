//! # Graph store
//!
//! Document ➜ sentences ➜ edges. A document springs into existence the
//! first time a sentence is stored under it and lives until it is
//! discarded (or the store is dropped). There is no eviction.
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryGraphStore` | `memory` | In-process maps behind `RwLock` |

pub mod memory;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Result;
use crate::model::{Edge, SentenceId};

pub use memory::MemoryGraphStore;

// ============================================================================
// DTOs
// ============================================================================

/// One stored sentence and the edges extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentence {
    pub sent_id: SentenceId,
    pub text: String,
    pub edges: Vec<Edge>,
    pub added_at: DateTime<Utc>,
}

/// Summary of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub doc_id: String,
    pub sentences: usize,
    pub edges: usize,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// GraphStore trait
// ============================================================================

pub trait GraphStore: Send + Sync {
    /// Store `edges` as the graph of `(doc_id, sent_id)`. Re-adding a
    /// sentence replaces its text and edges in place.
    fn insert_sentence(&self, doc_id: &str, sent_id: SentenceId, text: &str, edges: Vec<Edge>) -> Result<()>;

    /// Run `extract_fn` on the sentence and store what it returns. If the
    /// extractor fails nothing is recorded. Returns the number of edges.
    fn add_sentence<F>(&self, doc_id: &str, sent_id: SentenceId, text: &str, extract_fn: F) -> Result<usize>
    where
        Self: Sized,
        F: FnOnce(&str, &str, SentenceId) -> Result<Vec<Edge>>,
    {
        let edges = extract_fn(text, doc_id, sent_id)?;
        let count = edges.len();
        self.insert_sentence(doc_id, sent_id, text, edges)?;
        Ok(count)
    }

    /// Edges of one sentence; `Error::NotFound` if it was never stored.
    fn get_sentence_graph(&self, doc_id: &str, sent_id: SentenceId) -> Result<Vec<Edge>>;

    /// All edges of a document, flattened in sentence insertion order.
    /// An unknown document has no edges.
    fn get_doc_graph(&self, doc_id: &str) -> Result<Vec<Edge>>;

    fn sentence(&self, doc_id: &str, sent_id: SentenceId) -> Result<Sentence>;

    fn document(&self, doc_id: &str) -> Option<DocumentInfo>;

    /// Document ids, sorted.
    fn document_ids(&self) -> Vec<String>;

    /// Drop a document and everything under it. Returns whether it existed.
    fn discard_document(&self, doc_id: &str) -> bool;

    fn edge_count(&self, doc_id: &str) -> usize;
}
