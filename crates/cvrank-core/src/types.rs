//! Domain types shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::normalize::NormalizeStats;

pub type CandidateId = String;

/// One of the three independently scored dimensions of a résumé.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Experience,
    Education,
    Skills,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Experience, Category::Education, Category::Skills];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Experience => "experience",
            Category::Education => "education",
            Category::Skills => "skills",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value per category. Serializes as `{ experience, education, skills }`,
/// which is also the shape of the weights table in configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PerCategory<T> {
    pub experience: T,
    pub education: T,
    pub skills: T,
}

impl<T> PerCategory<T> {
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self {
            experience: f(Category::Experience),
            education: f(Category::Education),
            skills: f(Category::Skills),
        }
    }

    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Experience => &self.experience,
            Category::Education => &self.education,
            Category::Skills => &self.skills,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// Whether extraction found a structural heading for a category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Low,
}

/// Non-fatal extraction problems recorded on a profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum Degradation {
    /// No heading for the category was located; the category is empty.
    MissingSection(Category),
    /// Only an inline (non-structural) mention of a heading keyword was found.
    InlineHeading(Category),
}

/// A document handed over by the acquisition layer.
///
/// The text may be OCR output; it is never modified after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    id: CandidateId,
    text: String,
    page_count: u32,
    decode_placeholders: usize,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>, page_count: u32) -> Self {
        Self { id: id.into(), text: text.into(), page_count, decode_placeholders: 0 }
    }

    /// Decode bytes that may not be valid UTF-8. Invalid sequences become
    /// U+FFFD and are counted so the loss is visible in diagnostics.
    pub fn from_bytes(id: impl Into<String>, bytes: &[u8], page_count: u32) -> Self {
        let decoded = String::from_utf8_lossy(bytes);
        let before = bytes.windows(3).filter(|w| *w == "\u{FFFD}".as_bytes()).count();
        let after = decoded.matches('\u{FFFD}').count();
        Self {
            id: id.into(),
            text: decoded.into_owned(),
            page_count,
            decode_placeholders: after.saturating_sub(before),
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn text(&self) -> &str { &self.text }
    pub fn page_count(&self) -> u32 { self.page_count }
    pub fn decode_placeholders(&self) -> usize { self.decode_placeholders }
}

/// A year span as written in the résumé plus what could be parsed from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub raw: String,
    pub start_year: Option<u16>,
    pub end_year: Option<u16>,
    /// The range ends in "Present", "Current", "Devam" and similar.
    pub ongoing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperienceEntry {
    pub role: Option<String>,
    pub organization: Option<String>,
    pub date_range: Option<DateRange>,
    /// Full text of the entry, header lines included.
    pub text: String,
}

/// `year` is filled only when a year is actually present in `raw`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EducationDate {
    pub raw: String,
    pub year: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EducationEntry {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub date: Option<EducationDate>,
    pub text: String,
}

/// Structured view of one résumé. Built once by
/// [`ProfileBuilder`](crate::profile::ProfileBuilder) and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub(crate) id: CandidateId,
    pub(crate) page_count: u32,
    pub(crate) experience: Vec<ExperienceEntry>,
    pub(crate) education: Vec<EducationEntry>,
    pub(crate) skills: BTreeSet<String>,
    pub(crate) text: String,
    pub(crate) confidence: PerCategory<Confidence>,
    pub(crate) degradations: Vec<Degradation>,
    pub(crate) normalize_stats: NormalizeStats,
}

impl CandidateProfile {
    pub fn id(&self) -> &str { &self.id }
    pub fn page_count(&self) -> u32 { self.page_count }
    pub fn experience(&self) -> &[ExperienceEntry] { &self.experience }
    pub fn education(&self) -> &[EducationEntry] { &self.education }
    pub fn skills(&self) -> &BTreeSet<String> { &self.skills }
    /// Normalized document text.
    pub fn text(&self) -> &str { &self.text }
    pub fn confidence(&self) -> &PerCategory<Confidence> { &self.confidence }
    pub fn degradations(&self) -> &[Degradation] { &self.degradations }
    pub fn normalize_stats(&self) -> &NormalizeStats { &self.normalize_stats }

    pub fn is_empty(&self, category: Category) -> bool {
        match category {
            Category::Experience => self.experience.is_empty(),
            Category::Education => self.education.is_empty(),
            Category::Skills => self.skills.is_empty(),
        }
    }

    /// Concatenated text of one category, as handed to the encoder.
    pub fn category_text(&self, category: Category) -> String {
        match category {
            Category::Experience => {
                self.experience.iter().map(|e| e.text.as_str()).collect::<Vec<_>>().join("\n")
            }
            Category::Education => {
                self.education.iter().map(|e| e.text.as_str()).collect::<Vec<_>>().join("\n")
            }
            Category::Skills => self.skills.iter().map(String::as_str).collect::<Vec<_>>().join(", "),
        }
    }
}

/// The job description a batch is compared against. Sections that were not
/// pre-tagged fall back to the full description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRequirement {
    pub description: String,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub skills: Option<String>,
}

impl JobRequirement {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into(), ..Self::default() }
    }

    pub fn with_section(mut self, category: Category, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match category {
            Category::Experience => self.experience = text,
            Category::Education => self.education = text,
            Category::Skills => self.skills = text,
        }
        self
    }

    pub fn text_for(&self, category: Category) -> &str {
        let tagged = match category {
            Category::Experience => self.experience.as_deref(),
            Category::Education => self.education.as_deref(),
            Category::Skills => self.skills.as_deref(),
        };
        match tagged {
            Some(t) if !t.trim().is_empty() => t,
            _ => &self.description,
        }
    }
}

/// Similarity of one category. `value` is `None` when the encoder failed
/// for this category, which is distinct from a real score of zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CategoryScore {
    pub category: Category,
    pub value: Option<f32>,
}

impl CategoryScore {
    /// Non-finite input becomes 0; everything else is clamped to [0, 1].
    pub fn scored(category: Category, value: f32) -> Self {
        let value = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
        Self { category, value: Some(value) }
    }

    pub fn absent(category: Category) -> Self {
        Self { category, value: None }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Complete,
    /// At least one category could not be encoded.
    Partial,
    /// The candidate's task failed outright; all scores are absent.
    Failed,
}

/// One row of the final comparison table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// 1-based.
    pub rank: usize,
    pub candidate_id: CandidateId,
    pub scores: Vec<CategoryScore>,
    pub aggregate: f32,
    pub confidence: PerCategory<Confidence>,
    pub status: CandidateStatus,
    pub matched_skills: Vec<String>,
    pub failure: Option<String>,
}

impl ComparisonResult {
    pub fn score(&self, category: Category) -> Option<f32> {
        self.scores.iter().find(|s| s.category == category).and_then(|s| s.value)
    }
}
