//! Classification prompt and reply parsing for pass B.

/// What the classifier answered, after cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierReply {
    /// Reply named a type verbatim.
    Existing(String),
    /// Reply carried the `NEW:` marker.
    New(String),
}

impl ClassifierReply {
    pub fn name(&self) -> &str {
        match self {
            ClassifierReply::Existing(name) | ClassifierReply::New(name) => name,
        }
    }
}

pub fn classification_prompt(predicate: &str, pool: &[String]) -> String {
    let types = if pool.is_empty() { "(none yet)".to_string() } else { pool.join("\n") };
    format!(
        "Abstract edge types so far:\n{types}\n\n\
         Predicate: \"{predicate}\"\n\
         Reply with either an existing type *verbatim*, or\n\
         NEW: <short_name> if a new abstract type is needed."
    )
}

/// Parse a raw completion. `None` means the reply is unusable.
pub fn parse_reply(raw: &str) -> Option<ClassifierReply> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = strip_quotes(line);

    let marker = line.get(..4).filter(|head| head.eq_ignore_ascii_case("new:"));
    match marker {
        Some(_) => {
            let name = strip_quotes(line[4..].trim());
            (!name.is_empty()).then(|| ClassifierReply::New(name.to_string()))
        }
        None if line.is_empty() => None,
        None => Some(ClassifierReply::Existing(line.to_string())),
    }
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches(|c| matches!(c, '"' | '\'' | '`')).trim()
}
