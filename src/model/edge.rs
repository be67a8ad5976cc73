//! Graph edge: abstract type, two hypervectors, provenance metadata.

use serde::{Deserialize, Serialize};

use super::{AliasTier, Hypervector};

/// Sentence position inside its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentenceId(pub u64);

impl std::fmt::Display for SentenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SentenceId {
    fn from(id: u64) -> Self {
        SentenceId(id)
    }
}

/// Which pass of predicate abstraction decided the edge type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateSource {
    /// Seed table or persistent dictionary.
    #[serde(rename = "A")]
    Dictionary,
    /// Fresh classification by the completion service (or its fallback).
    #[serde(rename = "B")]
    Classified,
}

impl PredicateSource {
    pub fn tag(self) -> char {
        match self {
            PredicateSource::Dictionary => 'A',
            PredicateSource::Classified => 'B',
        }
    }
}

impl std::fmt::Display for PredicateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Provenance carried by every edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMeta {
    /// Lower-cased surface predicate.
    pub fine_pred: String,
    #[serde(rename = "abstract")]
    pub abstract_type: String,
    pub source: PredicateSource,
    pub subject: String,
    pub object: String,
    /// First entity id linked anywhere in the sentence.
    pub eid: Option<String>,
    /// Best alias tier seen in the sentence.
    pub alias_tier: AliasTier,
    pub doc_id: String,
    pub sent_id: SentenceId,
}

/// One knowledge-graph edge. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub edge_type: String,
    /// Role-bound literal encoding.
    pub surface: Hypervector,
    /// Predicate-anchored, permutation-abstracted encoding.
    pub semantic: Hypervector,
    pub meta: EdgeMeta,
}

impl Edge {
    pub fn dimension(&self) -> usize {
        self.surface.dim()
    }
}
