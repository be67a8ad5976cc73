//! Lossless word / separator tokenisation and sentence splitting.

use std::sync::LazyLock;

use regex::Regex;
use smallvec::SmallVec;

static TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\w+|\W+").ok());

pub type Tokens<'a> = SmallVec<[&'a str; 32]>;

/// Alternating runs of word and non-word characters. Concatenating the
/// tokens gives back the input exactly.
pub fn tokenize(text: &str) -> Tokens<'_> {
    match TOKEN.as_ref() {
        Some(re) => re.find_iter(text).map(|m| m.as_str()).collect(),
        None => SmallVec::from_elem(text, usize::from(!text.is_empty())),
    }
}

pub fn is_word(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// Split on `.`, `!` or `?` followed by whitespace. Pieces are trimmed and
/// empty pieces dropped; the terminator stays with its sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_some_and(|&(_, next)| next.is_whitespace());
        if boundary {
            let end = i + c.len_utf8();
            out.push(text[start..end].trim());
            start = end;
        }
    }
    out.push(text[start..].trim());
    out.retain(|s| !s.is_empty());
    out
}
