//! Assembles immutable candidate profiles from extractor output.

use crate::extract::dates;
use crate::extract::skills::{normalize_skill_set, SynonymTable};
use crate::extract::{ExtractedEducation, ExtractedExperience, Extraction};
use crate::normalize::Normalized;
use crate::types::{
    CandidateProfile, EducationDate, EducationEntry, ExperienceEntry, RawDocument,
};

/// Builds one [`CandidateProfile`] per document. Holds no state of its own
/// apart from the synonym table used to re-validate skill terms.
pub struct ProfileBuilder<'a> {
    synonyms: &'a SynonymTable,
}

impl<'a> ProfileBuilder<'a> {
    pub fn new(synonyms: &'a SynonymTable) -> Self {
        Self { synonyms }
    }

    pub fn build(&self, doc: &RawDocument, normalized: Normalized, extraction: Extraction) -> CandidateProfile {
        if doc.decode_placeholders() > 0 {
            tracing::warn!(
                candidate = doc.id(),
                placeholders = doc.decode_placeholders(),
                "document contained invalid UTF-8; replaced with placeholders"
            );
        }

        CandidateProfile {
            id: doc.id().to_string(),
            page_count: doc.page_count(),
            experience: extraction.experience.into_iter().filter_map(experience_entry).collect(),
            education: extraction.education.into_iter().filter_map(education_entry).collect(),
            skills: normalize_skill_set(extraction.skills.iter().map(String::as_str), self.synonyms),
            text: normalized.text,
            confidence: extraction.confidence,
            degradations: extraction.degradations,
            normalize_stats: normalized.stats,
        }
    }
}

fn experience_entry(e: ExtractedExperience) -> Option<ExperienceEntry> {
    let text = e.text.trim().to_string();
    if text.is_empty() {
        return None;
    }
    Some(ExperienceEntry {
        role: non_empty(e.role),
        organization: non_empty(e.organization),
        date_range: non_empty(e.date_raw).map(|raw| dates::parse_range(&raw)),
        text,
    })
}

fn education_entry(e: ExtractedEducation) -> Option<EducationEntry> {
    let text = e.text.trim().to_string();
    if text.is_empty() {
        return None;
    }
    Some(EducationEntry {
        degree: non_empty(e.degree),
        institution: non_empty(e.institution),
        date: non_empty(e.date_raw).map(|raw| education_date(&raw)),
        text,
    })
}

/// The graduation year is the latest year written in the date text. When
/// the text has no year at all, only the raw text is kept.
pub fn education_date(raw: &str) -> EducationDate {
    EducationDate { raw: raw.trim().to_string(), year: dates::years(raw).into_iter().max() }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
