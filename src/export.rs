//! Document export: Cypher script or JSON.
//!
//! ```text
//! GraphStore doc → export_cypher() → MERGE entities + CREATE edges
//!   → paste into Neo4j Browser or pipe into cypher-shell
//! ```

use std::io::Write;

use crate::Result;
use crate::model::Edge;
use crate::storage::GraphStore;

/// Export one document's edges as a Cypher script.
///
/// Every distinct subject/object becomes one `MERGE (:Entity {name})`;
/// every edge becomes one `CREATE` relationship typed by its upper-cased
/// abstract edge type.
pub fn export_cypher<S: GraphStore + ?Sized>(store: &S, doc_id: &str, writer: &mut dyn Write) -> Result<()> {
    let edges = store.get_doc_graph(doc_id)?;

    let mut entities: Vec<&str> = Vec::new();
    let mut seen = hashbrown::HashSet::new();
    for edge in &edges {
        for name in [edge.meta.subject.as_str(), edge.meta.object.as_str()] {
            if seen.insert(name) {
                entities.push(name);
            }
        }
    }

    writeln!(writer, "// sentence-graph Cypher export")?;
    writeln!(writer, "// Document: {doc_id}")?;
    writeln!(writer, "// Entities: {}", entities.len())?;
    writeln!(writer, "// Relationships: {}", edges.len())?;
    writeln!(writer)?;

    for name in &entities {
        writeln!(writer, "MERGE (:Entity {{name: {}}});", quote(name))?;
    }

    writeln!(writer)?;
    writeln!(writer, "// Relationships")?;

    for edge in &edges {
        writeln!(
            writer,
            "MATCH (a:Entity {{name: {}}}), (b:Entity {{name: {}}}) CREATE (a)-[:{} {{{}}}]->(b);",
            quote(&edge.meta.subject),
            quote(&edge.meta.object),
            rel_type(&edge.edge_type),
            format_properties(edge),
        )?;
    }
    Ok(())
}

/// Export one document's edges (vectors included) as a JSON array.
pub fn export_json<S: GraphStore + ?Sized>(store: &S, doc_id: &str, writer: &mut dyn Write) -> Result<()> {
    let edges = store.get_doc_graph(doc_id)?;
    serde_json::to_writer_pretty(&mut *writer, &edges)?;
    writeln!(writer)?;
    Ok(())
}

fn format_properties(edge: &Edge) -> String {
    let mut parts = vec![
        format!("fine_pred: {}", quote(&edge.meta.fine_pred)),
        format!("doc_id: {}", quote(&edge.meta.doc_id)),
        format!("sent_id: {}", edge.meta.sent_id),
        format!("alias_tier: {}", edge.meta.alias_tier.code()),
    ];
    if let Some(eid) = &edge.meta.eid {
        parts.push(format!("eid: {}", quote(eid)));
    }
    parts.join(", ")
}

/// Cypher string literal.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Upper-cased identifier; anything outside `[A-Za-z0-9_]` becomes `_`,
/// and a leading digit gets a `_` prefix so the type stays unquoted.
fn rel_type(edge_type: &str) -> String {
    let ident: String = edge_type
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c.to_ascii_uppercase() } else { '_' })
        .collect();
    match ident.chars().next() {
        None => "RELATED_TO".into(),
        Some(c) if c.is_ascii_digit() => format!("_{ident}"),
        Some(_) => ident,
    }
}
