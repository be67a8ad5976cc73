//! Rule-based extractor: `<subject> [is|was] <verb> [in|by|at] <object>`.
//!
//! One triple per sentence at most. Used offline and in tests where no
//! completion service is available.

use regex::Regex;

use super::TripleExtractor;
use crate::model::Triple;
use crate::{Error, Result};

pub const DEFAULT_VERBS: &[&str] = &["founded", "acquired", "located", "bought", "purchased", "started"];

#[derive(Debug, Clone)]
pub struct VerbPatternExtractor {
    pattern: Regex,
}

impl VerbPatternExtractor {
    pub fn new<I, S>(verbs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternation = verbs
            .into_iter()
            .map(|v| regex::escape(v.as_ref().trim()))
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join("|");
        if alternation.is_empty() {
            return Err(Error::Config("verb pattern extractor needs at least one verb".into()));
        }
        let pattern = Regex::new(&format!(
            r"(?i)^\s*(?P<subj>.+?)(?:\s+(?:is|was|are|were))?\s+(?P<verb>{alternation})(?:\s+(?:in|by|at))?\s+(?P<obj>.+?)[\s.!?]*$"
        ))
        .map_err(|e| Error::Config(format!("verb pattern: {e}")))?;
        Ok(Self { pattern })
    }

    pub fn with_default_verbs() -> Result<Self> {
        Self::new(DEFAULT_VERBS)
    }
}

impl TripleExtractor for VerbPatternExtractor {
    fn extract(&self, sentence: &str) -> Result<Vec<Triple>> {
        let Some(caps) = self.pattern.captures(sentence) else {
            return Ok(Vec::new());
        };
        Ok(Triple::new(&caps["subj"], &caps["verb"], &caps["obj"]).into_iter().collect())
    }
}
