//! Raw (subject, predicate, object) triple as delivered by an extractor.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A triple produced by a [`TripleExtractor`](crate::extract::TripleExtractor).
///
/// All three fields are whitespace-trimmed and non-empty. The predicate is
/// free text; abstraction to an edge type happens later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Result<Self> {
        let subject = clean("subject", subject.into())?;
        let predicate = clean("predicate", predicate.into())?;
        let object = clean("object", object.into())?;
        Ok(Self { subject, predicate, object })
    }
}

fn clean(field: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidTriple(format!("empty {field}")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims() {
        let t = Triple::new("  Jane Doe ", "founded", " Acme\n").unwrap();
        assert_eq!(t.subject, "Jane Doe");
        assert_eq!(t.object, "Acme");
    }

    #[test]
    fn test_new_rejects_blank() {
        assert!(Triple::new("a", "   ", "b").is_err());
        assert!(Triple::new("", "p", "b").is_err());
    }
}
