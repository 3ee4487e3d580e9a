//! Skill tokenization, term normalization and synonym resolution.
//!
//! A normalized term is folded (lower-case, no diacritics, dotless i
//! unified), stripped of bullets and quotes, and mapped through the synonym
//! table. Normalizing an already normalized term returns it unchanged.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use crate::normalize::fold;

/// Terms longer than this are sentences, not skills.
const MAX_TERM_CHARS: usize = 60;
const MAX_TERM_WORDS: usize = 5;

static DELIMITERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;•·▪■●◦\n\t|]+|\s{2,}").expect("skill delimiter pattern is valid"));

/// A short "Label:" at the start of a line, as in "Languages: Rust, Go".
static LINE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[^\n:,]{1,30}:\s*").expect("line label pattern is valid"));

/// Alias → canonical skill tag, both sides normalized. Chains are resolved
/// up front; a cycle collapses onto its smallest member.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    map: HashMap<String, String>,
}

impl SynonymTable {
    pub fn new(entries: &BTreeMap<String, String>) -> Self {
        let raw: HashMap<String, String> = entries
            .iter()
            .filter_map(|(alias, canonical)| Some((clean_term(alias)?, clean_term(canonical)?)))
            .filter(|(alias, canonical)| alias != canonical)
            .collect();

        let mut map = HashMap::with_capacity(raw.len());
        for key in raw.keys() {
            let terminal = resolve(&raw, key);
            if terminal != *key {
                map.insert(key.clone(), terminal);
            }
        }
        Self { map }
    }

    pub fn canonical<'a>(&'a self, term: &'a str) -> &'a str {
        self.map.get(term).map_or(term, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn resolve(raw: &HashMap<String, String>, key: &str) -> String {
    let mut path: Vec<&str> = vec![key];
    let mut current = key;
    while let Some(next) = raw.get(current) {
        if let Some(pos) = path.iter().position(|p| *p == next.as_str()) {
            return path[pos..].iter().min().map_or(next.as_str(), |m| *m).to_string();
        }
        path.push(next.as_str());
        current = next.as_str();
    }
    current.to_string()
}

/// Fold and clean a raw token. `None` for tokens that cannot be a skill.
fn clean_term(raw: &str) -> Option<String> {
    let folded = fold(raw);
    let kept: String = folded
        .chars()
        .map(|c| if c.is_alphanumeric() || " +#./&-".contains(c) { c } else { ' ' })
        .collect();
    let term = kept
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| ".-/&".contains(c) || c.is_whitespace())
        .to_string();

    let chars = term.chars().count();
    let too_short = chars < 2 && term != "c" && term != "r";
    let too_long = chars > MAX_TERM_CHARS || term.split(' ').count() > MAX_TERM_WORDS;
    if term.is_empty() || too_short || too_long {
        return None;
    }
    Some(term)
}

/// Normalize one skill term: clean, fold and map to its canonical tag.
pub fn normalize_term(raw: &str, synonyms: &SynonymTable) -> Option<String> {
    let term = clean_term(raw)?;
    Some(synonyms.canonical(&term).to_string())
}

/// Split a Skills body on delimiters (commas, bullets, newlines, pipes).
pub fn tokenize(body: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for label in LINE_LABEL.find_iter(body) {
        tokens.extend(DELIMITERS.split(&body[last..label.start()]));
        last = label.end();
    }
    tokens.extend(DELIMITERS.split(&body[last..]));
    tokens.into_iter().map(str::trim).filter(|t| !t.is_empty()).collect()
}

pub fn extract_skills(body: &str, synonyms: &SynonymTable) -> BTreeSet<String> {
    tokenize(body).into_iter().filter_map(|t| normalize_term(t, synonyms)).collect()
}

/// Re-normalize an existing skill set. Idempotent: applying it to its own
/// output returns the same set.
pub fn normalize_skill_set<'a, I>(skills: I, synonyms: &SynonymTable) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    skills.into_iter().filter_map(|t| normalize_term(t, synonyms)).collect()
}
