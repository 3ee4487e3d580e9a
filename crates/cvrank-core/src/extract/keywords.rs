use regex::Regex;

use crate::error::{Error, Result};
use crate::normalize::{fold, fold_with_offsets};

/// A keyword occurrence, with offsets into the unfolded source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordHit {
    /// The folded keyword that matched.
    pub keyword: String,
    pub start: usize,
    pub end: usize,
}

/// Case- and diacritic-insensitive matcher over a keyword list.
///
/// Longer keywords are tried first, so "Technical Skills" wins over
/// "Skills" at the same position.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    pattern: Option<Regex>,
}

impl KeywordMatcher {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self> {
        let mut folded: Vec<String> = keywords
            .iter()
            .map(|k| fold(k.as_ref().trim()))
            .filter(|k| !k.is_empty())
            .collect();
        folded.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        folded.dedup();
        if folded.is_empty() {
            return Ok(Self { pattern: None });
        }

        let alternation = folded
            .iter()
            .map(|k| format!("{}{}{}", edge(k.chars().next()), regex::escape(k), edge(k.chars().last())))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!("(?:{alternation})"))
            .map_err(|e| Error::Configuration(format!("invalid keyword list: {e}")))?;
        Ok(Self { pattern: Some(pattern) })
    }

    pub fn find_iter(&self, text: &str) -> Vec<KeywordHit> {
        let Some(pattern) = &self.pattern else { return Vec::new() };
        let folded = fold_with_offsets(text);
        pattern
            .find_iter(&folded.text)
            .map(|m| KeywordHit {
                keyword: m.as_str().to_string(),
                start: folded.source_offset(m.start()),
                end: folded.source_offset(m.end()),
            })
            .collect()
    }

    pub fn find(&self, text: &str) -> Option<KeywordHit> {
        self.find_iter(text).into_iter().next()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.find(text).is_some()
    }
}

fn edge(c: Option<char>) -> &'static str {
    match c {
        Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
        _ => r"\B",
    }
}
