//! Passive → active rewrite for a closed set of verbs.
//!
//! `"<obj> was <verb> by <subj>."` becomes `"<subj> <verb> <obj>."`; every
//! other sentence passes through untouched.

use std::borrow::Cow;

use regex::Regex;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct VoiceNormalizer {
    /// `None` when no verbs are configured: nothing is ever rewritten.
    passive: Option<Regex>,
}

impl VoiceNormalizer {
    pub fn new<S: AsRef<str>>(verbs: &[S]) -> Result<Self> {
        let alternation = verbs
            .iter()
            .map(|v| regex::escape(v.as_ref().trim()))
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join("|");
        if alternation.is_empty() {
            return Ok(Self { passive: None });
        }
        let passive = Regex::new(&format!(
            r"(?i)^(?P<obj>.+?)\s+was\s+(?P<verb>{alternation})\s+by\s+(?P<subj>.+?)\.*$"
        ))
        .map_err(|e| Error::Config(format!("passive pattern: {e}")))?;
        Ok(Self { passive: Some(passive) })
    }

    pub fn normalize<'a>(&self, sentence: &'a str) -> Cow<'a, str> {
        let Some(caps) = self.passive.as_ref().and_then(|re| re.captures(sentence.trim())) else {
            return Cow::Borrowed(sentence);
        };
        Cow::Owned(format!(
            "{} {} {}.",
            caps["subj"].trim(),
            caps["verb"].to_lowercase(),
            caps["obj"].trim()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normalizer() -> VoiceNormalizer {
        VoiceNormalizer::new(&["founded", "acquired", "located"]).unwrap()
    }

    #[test]
    fn test_passive_rewrite() {
        assert_eq!(normalizer().normalize("Acme Corp was founded by Jane Doe."), "Jane Doe founded Acme Corp.");
        assert_eq!(normalizer().normalize("  Globex was ACQUIRED by Initech "), "Initech acquired Globex.");
    }

    #[test]
    fn test_other_sentences_pass_through() {
        let n = normalizer();
        assert!(matches!(n.normalize("Jane Doe founded Acme."), Cow::Borrowed(_)));
        assert_eq!(n.normalize("Acme was praised by critics."), "Acme was praised by critics.");
    }

    #[test]
    fn test_no_verbs_never_rewrites() {
        let n = VoiceNormalizer::new::<&str>(&[]).unwrap();
        assert_eq!(n.normalize("Acme was founded by Jane."), "Acme was founded by Jane.");
    }
}
