//! Field extractor: segments normalized text into Experience, Education and
//! Skills, then splits each section into entries.
//!
//! Extraction is best-effort and never fails for a single document; missing
//! sections come back empty with a low-confidence flag.

pub mod dates;
pub mod education;
pub mod experience;
pub mod headings;
pub mod keywords;
pub mod skills;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::types::{Category, Confidence, Degradation, PerCategory};

use headings::HeadingIndex;
use keywords::KeywordMatcher;
use skills::SynonymTable;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedExperience {
    pub role: Option<String>,
    pub organization: Option<String>,
    pub date_raw: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedEducation {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub date_raw: Option<String>,
    pub text: String,
}

/// Raw extractor output, before profile assembly.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub experience: Vec<ExtractedExperience>,
    pub education: Vec<ExtractedEducation>,
    pub skills: BTreeSet<String>,
    pub confidence: PerCategory<Confidence>,
    pub degradations: Vec<Degradation>,
}

impl Extraction {
    /// Categories that ended up with nothing in them.
    pub fn empty_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| match c {
                Category::Experience => self.experience.is_empty(),
                Category::Education => self.education.is_empty(),
                Category::Skills => self.skills.is_empty(),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct FieldExtractor {
    headings: HeadingIndex,
    synonyms: SynonymTable,
    degrees: KeywordMatcher,
    institutions: KeywordMatcher,
}

impl FieldExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            headings: HeadingIndex::new(config)?,
            synonyms: SynonymTable::new(&config.synonyms),
            degrees: KeywordMatcher::new(&config.degree_keywords)?,
            institutions: KeywordMatcher::new(&config.institution_keywords)?,
        })
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    /// Extract all three categories from already normalized text.
    pub fn extract(&self, text: &str) -> Extraction {
        let sections = self.headings.locate(text);
        let body = |c: Category| sections.bodies.get(c).as_deref().unwrap_or("");

        let extraction = Extraction {
            experience: experience::split_entries(body(Category::Experience)),
            education: education::split_entries(body(Category::Education), &self.degrees, &self.institutions),
            skills: skills::extract_skills(body(Category::Skills), &self.synonyms),
            confidence: sections.confidence,
            degradations: sections.degradations,
        };

        tracing::debug!(
            experience = extraction.experience.len(),
            education = extraction.education.len(),
            skills = extraction.skills.len(),
            "extracted fields"
        );
        extraction
    }
}
