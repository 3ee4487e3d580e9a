//! Human-readable summary of ranked results.

use serde::Serialize;
use std::fmt;

use crate::types::{CandidateStatus, Category, ComparisonResult, Confidence};

const MAX_LISTED_SKILLS: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FitBand {
    High,
    Medium,
    Low,
}

impl FitBand {
    pub fn for_score(aggregate: f32) -> Self {
        if aggregate > 0.75 {
            FitBand::High
        } else if aggregate > 0.5 {
            FitBand::Medium
        } else {
            FitBand::Low
        }
    }
}

impl fmt::Display for FitBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FitBand::High => "High",
            FitBand::Medium => "Medium",
            FitBand::Low => "Low",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportLine {
    pub rank: usize,
    pub candidate_id: String,
    pub band: FitBand,
    /// Experience similarity as a whole percentage, `None` when absent.
    pub experience_pct: Option<u32>,
    pub matched_skills: Vec<String>,
    pub flags: Vec<String>,
}

impl ReportLine {
    pub fn from_result(result: &ComparisonResult) -> Self {
        let mut flags = Vec::new();
        match result.status {
            CandidateStatus::Complete => {}
            CandidateStatus::Partial => flags.push("partial".to_string()),
            CandidateStatus::Failed => flags.push("failed".to_string()),
        }
        for (category, confidence) in result.confidence.iter() {
            if *confidence == Confidence::Low && result.status != CandidateStatus::Failed {
                flags.push(format!("low-confidence {category}"));
            }
        }

        Self {
            rank: result.rank,
            candidate_id: result.candidate_id.clone(),
            band: FitBand::for_score(result.aggregate),
            experience_pct: result
                .score(Category::Experience)
                .map(|v| (v * 100.0).round() as u32),
            matched_skills: result.matched_skills.iter().take(MAX_LISTED_SKILLS).cloned().collect(),
            flags,
        }
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} [{} fit]", self.rank, self.candidate_id, self.band)?;
        match self.experience_pct {
            Some(pct) => write!(f, " experience match {pct}%")?,
            None => write!(f, " experience match n/a")?,
        }
        if !self.matched_skills.is_empty() {
            write!(f, "; skills: {}", self.matched_skills.join(", "))?;
        }
        if !self.flags.is_empty() {
            write!(f, " ({})", self.flags.join(", "))?;
        }
        Ok(())
    }
}

pub fn summarize(results: &[ComparisonResult]) -> Vec<ReportLine> {
    results.iter().map(ReportLine::from_result).collect()
}
