//! In-memory graph store.
//!
//! One `RwLock` over the document map. Writers to different documents
//! still serialise on it, which is fine for the sizes this holds; readers
//! clone edges out so no lock escapes a call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use parking_lot::RwLock;

use super::{DocumentInfo, GraphStore, Sentence};
use crate::model::{Edge, SentenceId};
use crate::{Error, Result};

// ============================================================================
// MemoryGraphStore
// ============================================================================

#[derive(Clone, Default)]
pub struct MemoryGraphStore {
    inner: Arc<RwLock<HashMap<String, Document>>>,
}

struct Document {
    created_at: DateTime<Utc>,
    /// First-insertion order of sentence ids.
    order: Vec<SentenceId>,
    sentences: HashMap<SentenceId, Sentence>,
    /// Flattened edges of `order`.
    edges: Vec<Edge>,
}

impl Document {
    fn new() -> Self {
        Self { created_at: Utc::now(), order: Vec::new(), sentences: HashMap::new(), edges: Vec::new() }
    }

    fn rebuild_edges(&mut self) {
        let sentences = &self.sentences;
        self.edges = self
            .order
            .iter()
            .filter_map(|id| sentences.get(id))
            .flat_map(|s| s.edges.iter().cloned())
            .collect();
    }
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGraphStore").field("documents", &self.inner.read().len()).finish()
    }
}

// ============================================================================
// GraphStore impl
// ============================================================================

impl GraphStore for MemoryGraphStore {
    fn insert_sentence(&self, doc_id: &str, sent_id: SentenceId, text: &str, edges: Vec<Edge>) -> Result<()> {
        let mut docs = self.inner.write();
        let doc = docs.entry_ref(doc_id).or_insert_with(Document::new);
        let sentence = Sentence { sent_id, text: text.to_string(), edges, added_at: Utc::now() };

        match doc.sentences.insert(sent_id, sentence) {
            None => {
                doc.order.push(sent_id);
                if let Some(stored) = doc.sentences.get(&sent_id) {
                    doc.edges.extend(stored.edges.iter().cloned());
                }
            }
            Some(_) => {
                tracing::debug!(doc_id, %sent_id, "sentence replaced");
                doc.rebuild_edges();
            }
        }
        Ok(())
    }

    fn get_sentence_graph(&self, doc_id: &str, sent_id: SentenceId) -> Result<Vec<Edge>> {
        self.sentence(doc_id, sent_id).map(|s| s.edges)
    }

    fn get_doc_graph(&self, doc_id: &str) -> Result<Vec<Edge>> {
        Ok(self.inner.read().get(doc_id).map(|d| d.edges.clone()).unwrap_or_default())
    }

    fn sentence(&self, doc_id: &str, sent_id: SentenceId) -> Result<Sentence> {
        self.inner
            .read()
            .get(doc_id)
            .and_then(|d| d.sentences.get(&sent_id))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("sentence {doc_id}/{sent_id}")))
    }

    fn document(&self, doc_id: &str) -> Option<DocumentInfo> {
        self.inner.read().get(doc_id).map(|d| DocumentInfo {
            doc_id: doc_id.to_string(),
            sentences: d.order.len(),
            edges: d.edges.len(),
            created_at: d.created_at,
        })
    }

    fn document_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn discard_document(&self, doc_id: &str) -> bool {
        self.inner.write().remove(doc_id).is_some()
    }

    fn edge_count(&self, doc_id: &str) -> usize {
        self.inner.read().get(doc_id).map_or(0, |d| d.edges.len())
    }
}
