//! End-to-end tests for the `SentenceGraph` handle: ingestion, storage and export.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use sentence_graph::{
    Config, Error, GraphStore, HashingEmbedder, Result, SentenceGraph, SentenceGraphPipeline, SentenceId, Triple,
    TripleExtractor, VerbPatternExtractor,
};

fn graph_with(dir: &std::path::Path, extractor: Arc<dyn TripleExtractor>) -> SentenceGraph {
    let mut config = Config::with_resources(dir);
    config.dimension = 256;
    let pipeline = SentenceGraphPipeline::builder(config)
        .encoder_embeddings(Arc::new(HashingEmbedder::new(64)))
        .extractor(extractor)
        .build()
        .unwrap();
    SentenceGraph::in_memory(pipeline)
}

fn graph(dir: &std::path::Path) -> SentenceGraph {
    graph_with(dir, Arc::new(VerbPatternExtractor::with_default_verbs().unwrap()))
}

#[test]
fn test_ingest_document_stores_every_sentence() {
    let dir = tempfile::tempdir().unwrap();
    let g = graph(dir.path());

    let report = g
        .ingest_document(
            "news",
            "Acme was founded by Jane Doe. Globex acquired Initech! The weather was mild. Initech is located in Springfield.",
        )
        .unwrap();
    assert_eq!(report.sentences, 4);
    assert_eq!(report.edges, 3);
    assert!(report.failures.is_empty());

    let types: Vec<String> = g.get_doc_graph("news").unwrap().into_iter().map(|e| e.edge_type).collect();
    assert_eq!(types, vec!["founded_by", "acquired_by", "located_in"]);

    assert!(g.get_sentence_graph("news", 2u64).unwrap().is_empty());
    assert_eq!(g.get_sentence_graph("news", 3u64).unwrap()[0].meta.sent_id, SentenceId(3));
    assert_eq!(g.store().sentence("news", SentenceId(1)).unwrap().text, "Globex acquired Initech!");
}

#[test]
fn test_failed_sentence_is_reported_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = VerbPatternExtractor::with_default_verbs().unwrap();
    let flaky = move |sentence: &str| -> Result<Vec<Triple>> {
        if sentence.contains("Broken") {
            return Err(Error::Extraction { attempts: 3, message: "service unavailable".into() });
        }
        pattern.extract(sentence)
    };
    let g = graph_with(dir.path(), Arc::new(flaky));

    let report = g.ingest_document("d", "Jane Doe founded Acme. Broken founded Nothing. Globex acquired Initech.").unwrap();
    assert_eq!(report.sentences, 2);
    assert_eq!(report.edges, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].sent_id, SentenceId(1));

    assert!(matches!(g.get_sentence_graph("d", 1u64), Err(Error::NotFound(_))));
    assert_eq!(g.store().edge_count("d"), 2);
}

#[test]
fn test_reingest_sentence_replaces_edges() {
    let dir = tempfile::tempdir().unwrap();
    let g = graph(dir.path());

    g.ingest_sentence("d", 0u64, "Jane Doe founded Acme.").unwrap();
    g.ingest_sentence("d", 1u64, "Globex acquired Initech.").unwrap();
    g.ingest_sentence("d", 0u64, "Acme is located in Springfield.").unwrap();

    let types: Vec<String> = g.get_doc_graph("d").unwrap().into_iter().map(|e| e.edge_type).collect();
    assert_eq!(types, vec!["located_in", "acquired_by"]);
}

#[test]
fn test_documents_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let g = graph(dir.path());
    g.ingest_sentence("a", 0u64, "Jane Doe founded Acme.").unwrap();
    g.ingest_sentence("b", 0u64, "Globex acquired Initech.").unwrap();

    assert_eq!(g.store().document_ids(), vec!["a", "b"]);
    assert!(g.store().discard_document("a"));
    assert!(g.get_doc_graph("a").unwrap().is_empty());
    assert_eq!(g.get_doc_graph("b").unwrap().len(), 1);
}

#[test]
fn test_export_cypher_script() {
    let dir = tempfile::tempdir().unwrap();
    let g = graph(dir.path());
    g.ingest_document("d", "Jane Doe founded Acme. Jane Doe founded Globex.").unwrap();

    let mut out = Vec::new();
    g.export_cypher("d", &mut out).unwrap();
    let script = String::from_utf8(out).unwrap();

    assert_eq!(script.matches("MERGE (:Entity {name: 'Jane Doe'})").count(), 1);
    assert_eq!(script.matches("-[:FOUNDED_BY").count(), 2);
    assert!(script.contains("sent_id: 1"));
}

#[test]
fn test_stats_snapshot_after_ingest() {
    let dir = tempfile::tempdir().unwrap();
    let g = graph(dir.path());
    g.ingest_document("d", "Jane Doe founded Acme. Globex acquired Initech. Globex acquired Hooli.").unwrap();

    let snap = g.stats();
    assert_eq!(snap.edge_types.get("acquired_by"), Some(&2));
    assert_eq!(snap.edge_types.get("founded_by"), Some(&1));
    assert_eq!(snap.alias_tiers.get(&-1), Some(&3));
    assert_eq!(snap.dropped_edges, 0);
}
