//! Ranking aggregator: turns per-candidate scores into the ordered
//! comparison table.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::scoring::aggregate;
use crate::types::{
    CandidateId, CandidateStatus, Category, CategoryScore, ComparisonResult, Confidence, PerCategory,
};

/// Everything known about one candidate once scoring finished or failed.
#[derive(Debug, Clone)]
pub struct CandidateOutcome {
    pub id: CandidateId,
    pub scores: Vec<CategoryScore>,
    pub confidence: PerCategory<Confidence>,
    pub status: CandidateStatus,
    pub matched_skills: Vec<String>,
    pub failure: Option<String>,
}

impl CandidateOutcome {
    /// A candidate whose processing failed outright. All scores are absent.
    pub fn failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scores: Category::ALL.into_iter().map(CategoryScore::absent).collect(),
            confidence: PerCategory::default(),
            status: CandidateStatus::Failed,
            matched_skills: Vec::new(),
            failure: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankingAggregator {
    weights: PerCategory<f64>,
    max_batch_size: usize,
}

impl RankingAggregator {
    pub fn new(weights: PerCategory<f64>, max_batch_size: usize) -> Self {
        Self { weights, max_batch_size }
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn check_capacity(&self, requested: usize) -> Result<()> {
        if requested > self.max_batch_size {
            return Err(Error::Capacity { requested, max: self.max_batch_size });
        }
        Ok(())
    }

    /// Sort by aggregate descending, ties by candidate id ascending, and
    /// assign 1-based ranks.
    pub fn rank(&self, outcomes: Vec<CandidateOutcome>) -> Result<Vec<ComparisonResult>> {
        self.check_capacity(outcomes.len())?;

        let mut results: Vec<ComparisonResult> = outcomes
            .into_iter()
            .map(|o| ComparisonResult {
                rank: 0,
                aggregate: aggregate(&o.scores, &self.weights),
                candidate_id: o.id,
                scores: o.scores,
                confidence: o.confidence,
                status: o.status,
                matched_skills: o.matched_skills,
                failure: o.failure,
            })
            .collect();

        results.sort_by(compare);
        for (i, r) in results.iter_mut().enumerate() {
            r.rank = i + 1;
        }
        Ok(results)
    }
}

fn compare(a: &ComparisonResult, b: &ComparisonResult) -> Ordering {
    b.aggregate
        .total_cmp(&a.aggregate)
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}
