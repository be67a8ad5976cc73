//! Tier 1: per-document fuzzy index.
//!
//! Candidate spans are runs of capitalised word-like tokens (each at least
//! three characters, up to `max_span_words` words), deduplicated in
//! first-seen order. Each span is embedded once when the index is built;
//! queries are dot products against the unit-length span embeddings.

use std::sync::Arc;

use regex::Regex;

use crate::embedding::EmbeddingProvider;
use crate::model::Matrix;
use crate::model::matrix::dot;
use crate::{Error, Result};

pub struct DocumentFuzzyIndex {
    spans: Vec<String>,
    embeddings: Matrix,
}

impl DocumentFuzzyIndex {
    /// Build from document text with a pattern from [`span_pattern`].
    /// Fails only if the provider fails.
    pub fn build(text: &str, embedder: &Arc<dyn EmbeddingProvider>, pattern: &Regex) -> Result<Self> {
        let spans = spans_matching(pattern, text);
        if spans.is_empty() {
            return Ok(Self::empty(embedder.dimension()));
        }
        let refs: Vec<&str> = spans.iter().map(String::as_str).collect();
        let embeddings = Matrix::from_rows(embedder.embed_batch(&refs)?)?;
        tracing::debug!(spans = spans.len(), "document fuzzy index built");
        Ok(Self { spans, embeddings })
    }

    pub fn empty(dimension: usize) -> Self {
        Self { spans: Vec::new(), embeddings: Matrix::empty(dimension) }
    }

    pub fn spans(&self) -> &[String] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Highest-scoring span and its score. The earliest span wins ties.
    pub fn best_match(&self, query: &[f32]) -> Option<(&str, f32)> {
        if query.len() != self.embeddings.cols() {
            return None;
        }
        let mut best: Option<(usize, f32)> = None;
        for (i, row) in self.embeddings.iter_rows().enumerate() {
            let score = dot(row, query);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        best.map(|(i, s)| (self.spans[i].as_str(), s))
    }
}

impl std::fmt::Debug for DocumentFuzzyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentFuzzyIndex").field("spans", &self.spans).finish()
    }
}

/// Capitalised runs of up to `max_span_words` words. Compile once and reuse.
pub fn span_pattern(max_span_words: usize) -> Result<Regex> {
    let extra = max_span_words.saturating_sub(1);
    let pattern = format!(r"\b([A-Z][\w\-]{{2,}}(?:\s+[A-Z][\w\-]{{2,}}){{0,{extra}}})");
    Regex::new(&pattern).map_err(|e| Error::Config(format!("span pattern: {e}")))
}

/// Capitalised multi-word spans, first-seen order, no duplicates.
pub fn candidate_spans(text: &str, max_span_words: usize) -> Vec<String> {
    span_pattern(max_span_words).map(|re| spans_matching(&re, text)).unwrap_or_default()
}

/// Spans matched by a compiled [`span_pattern`], first-seen order, no duplicates.
pub fn spans_matching(pattern: &Regex, text: &str) -> Vec<String> {
    let mut seen = hashbrown::HashSet::new();
    pattern
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|span| seen.insert(span.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;

    #[test]
    fn test_candidate_spans() {
        let spans = candidate_spans(
            "Jane Doe founded Acme Corporation in Springfield. Later Jane Doe left. It was ok.",
            5,
        );
        assert_eq!(spans, vec!["Jane Doe", "Acme Corporation", "Springfield", "Later Jane Doe"]);
    }

    #[test]
    fn test_span_word_limit() {
        let spans = candidate_spans("Alpha Beta Gamma Delta", 2);
        assert_eq!(spans, vec!["Alpha Beta", "Gamma Delta"]);
    }

    #[test]
    fn test_compiled_pattern_reused_across_documents() {
        let pattern = span_pattern(5).unwrap();
        assert_eq!(spans_matching(&pattern, "Jane Doe founded Acme."), vec!["Jane Doe", "Acme"]);
        assert_eq!(spans_matching(&pattern, "Globex hired Initech staff."), vec!["Globex", "Initech"]);
    }

    #[test]
    fn test_short_words_excluded() {
        assert!(candidate_spans("I am at NY", 5).is_empty());
    }

    #[test]
    fn test_best_match() {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::default());
        let pattern = span_pattern(5).unwrap();
        let idx = DocumentFuzzyIndex::build("Zentrix builds rockets with Orbital Dynamics.", &embedder, &pattern).unwrap();
        assert_eq!(idx.spans(), &["Zentrix", "Orbital Dynamics"]);

        let q = embedder.embed("Zentrix").unwrap();
        let (span, score) = idx.best_match(&q).unwrap();
        assert_eq!(span, "Zentrix");
        assert!(score > 0.99);
    }

    #[test]
    fn test_empty_index_never_matches() {
        let idx = DocumentFuzzyIndex::empty(8);
        assert!(idx.best_match(&[0.0; 8]).is_none());
    }
}
