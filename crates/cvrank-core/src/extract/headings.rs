//! Section-heading location.
//!
//! Headings are a heuristic over free text: every keyword occurrence becomes
//! a `(kind, offset)` hit, and priority rules pick at most one hit per
//! category. A hit is structural when the keyword stands alone on its line
//! or is immediately followed by a colon; anything else is inline prose.

use std::collections::HashMap;

use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::types::{Category, Confidence, Degradation, PerCategory};

use super::keywords::KeywordMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadingKind {
    Target(Category),
    /// A section that is not scored but ends the one before it.
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Standalone,
    Colon,
    Inline,
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    kind: HeadingKind,
    form: Form,
    start: usize,
    /// Where the section body begins.
    body_start: usize,
}

/// Category bodies cut out of a normalized document.
#[derive(Debug, Clone, Default)]
pub struct Sections {
    pub bodies: PerCategory<Option<String>>,
    pub confidence: PerCategory<Confidence>,
    pub degradations: Vec<Degradation>,
}

#[derive(Debug, Clone)]
pub struct HeadingIndex {
    matcher: KeywordMatcher,
    kinds: HashMap<String, HeadingKind>,
}

impl HeadingIndex {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let mut kinds = HashMap::new();
        let mut keywords = Vec::new();
        // Scored categories are registered first, so a keyword listed both as
        // a target and as a boundary stays a target.
        for set in config.active_headings() {
            for category in Category::ALL {
                for k in set.for_category(category) {
                    let folded = crate::normalize::fold(k.trim());
                    kinds.entry(folded).or_insert(HeadingKind::Target(category));
                    keywords.push(k.clone());
                }
            }
        }
        for set in config.active_headings() {
            for k in &set.other {
                let folded = crate::normalize::fold(k.trim());
                kinds.entry(folded).or_insert(HeadingKind::Boundary);
                keywords.push(k.clone());
            }
        }
        Ok(Self { matcher: KeywordMatcher::new(&keywords)?, kinds })
    }

    pub fn locate(&self, text: &str) -> Sections {
        let hits: Vec<Hit> = self
            .matcher
            .find_iter(text)
            .into_iter()
            .filter_map(|h| {
                let kind = *self.kinds.get(&h.keyword)?;
                let (form, body_start) = classify(text, h.start, h.end);
                Some(Hit { kind, form, start: h.start, body_start })
            })
            .collect();

        let midpoint = text.len() / 2;
        let mut sections = Sections::default();
        let mut selected: Vec<(Category, Hit)> = Vec::new();

        for category in Category::ALL {
            let of_category = || hits.iter().filter(move |h| h.kind == HeadingKind::Target(category));
            let structural = of_category().find(|h| h.form != Form::Inline);
            // Inline mentions late in the document are usually prose that
            // happens to contain the keyword, so only early ones are used.
            let inline = || of_category().find(|h| h.form == Form::Inline && h.start < midpoint);

            let confidence = match (structural, inline()) {
                (Some(hit), _) => {
                    selected.push((category, *hit));
                    Confidence::High
                }
                (None, Some(hit)) => {
                    selected.push((category, *hit));
                    sections.degradations.push(Degradation::InlineHeading(category));
                    Confidence::Low
                }
                (None, None) => {
                    sections.degradations.push(Degradation::MissingSection(category));
                    Confidence::Low
                }
            };
            set(&mut sections.confidence, category, confidence);
        }

        // Structural headings end the section above them; inline mentions
        // only count when selected. Boundary headings must stand alone, as
        // "Languages: Rust, Go" inside a Skills body is a sub-label.
        let mut stops: Vec<usize> = hits
            .iter()
            .filter(|h| match h.kind {
                HeadingKind::Target(_) => h.form != Form::Inline,
                HeadingKind::Boundary => h.form == Form::Standalone,
            })
            .map(|h| h.start)
            .chain(selected.iter().map(|(_, h)| h.start))
            .collect();
        stops.sort_unstable();
        stops.dedup();

        for (category, hit) in selected {
            let end = stops
                .iter()
                .copied()
                .find(|s| *s > hit.start && *s >= hit.body_start)
                .unwrap_or(text.len());
            let body = if hit.body_start < end { text[hit.body_start..end].trim() } else { "" };
            tracing::trace!(%category, start = hit.start, len = body.len(), "located section");
            set(&mut sections.bodies, category, Some(body.to_string()));
        }

        sections
    }
}

fn set<T>(map: &mut PerCategory<T>, category: Category, value: T) {
    match category {
        Category::Experience => map.experience = value,
        Category::Education => map.education = value,
        Category::Skills => map.skills = value,
    }
}

const MARKERS: &[char] = &['•', '-', '–', '*', '#', '▪', '■', '●', '·', '>', '|', '=', '_'];

/// Decide the heading form and where its body starts.
fn classify(text: &str, start: usize, end: usize) -> (Form, usize) {
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[end..].find('\n').map_or(text.len(), |i| end + i);
    let prefix = &text[line_start..start];
    let suffix = &text[end..line_end];

    let leads_line = prefix.chars().all(|c| c.is_whitespace() || MARKERS.contains(&c) || c.is_ascii_digit() || c == '.');
    if leads_line {
        let rest = suffix.trim_start();
        if let Some(after_colon) = rest.strip_prefix(':') {
            if after_colon.trim().is_empty() {
                return (Form::Standalone, line_end);
            }
            return (Form::Colon, line_end - after_colon.len());
        }
        if rest.chars().all(|c| c.is_whitespace() || MARKERS.contains(&c)) {
            return (Form::Standalone, line_end);
        }
    }

    let body_start = suffix
        .trim_start()
        .strip_prefix(':')
        .map_or(end, |after| line_end - after.len());
    (Form::Inline, body_start)
}
