//! One comparison run: normalize, extract, build, score and rank a batch of
//! résumés against a single job requirement.
//!
//! Candidates are processed on blocking tasks and joined before ranking, so
//! no partial table is ever produced. A candidate that fails, or does not
//! finish within its encoder budget, is reported as a failed row; only
//! configuration and capacity errors abort a run.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::Settings;
use crate::error::Result;
use crate::extract::FieldExtractor;
use crate::normalize::normalize;
use crate::profile::ProfileBuilder;
use crate::ranking::{CandidateOutcome, RankingAggregator};
use crate::scoring::{JobEmbedding, JobEmbeddings, SemanticScorer, SkillMatcher};
use crate::traits::Embedder;
use crate::types::{
    CandidateStatus, Category, ComparisonResult, JobRequirement, PerCategory, RawDocument,
};

/// Counters for the presentation layer. Summed over the whole batch.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RunDiagnostics {
    pub candidates: usize,
    pub chars_repaired: usize,
    pub placeholders: usize,
    pub categories_defaulted_empty: usize,
    pub encoding_failures: usize,
    pub failed_candidates: usize,
    pub encoder_calls: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub results: Vec<ComparisonResult>,
    pub diagnostics: RunDiagnostics,
}

struct Stages {
    extractor: FieldExtractor,
    scorer: SemanticScorer,
    encoder: Arc<dyn Embedder>,
    skill_match_threshold: f64,
}

#[derive(Default)]
struct CandidateStats {
    chars_repaired: usize,
    placeholders: usize,
    empty_categories: usize,
    encoding_failures: usize,
    encoder_calls: usize,
}

struct CandidateRun {
    outcome: CandidateOutcome,
    stats: CandidateStats,
}

pub struct Pipeline {
    stages: Arc<Stages>,
    aggregator: RankingAggregator,
}

impl Pipeline {
    /// Fails with a configuration error before anything is processed.
    pub fn new(settings: Settings, encoder: Arc<dyn Embedder>) -> Result<Self> {
        settings.validate()?;
        let extractor = FieldExtractor::new(&settings.extraction)?;
        let scorer = SemanticScorer::new(&settings.scoring)?;
        let aggregator =
            RankingAggregator::new(settings.scoring.weights, settings.scoring.max_batch_size);
        tracing::debug!(encoder = %encoder.id(), "pipeline ready");
        Ok(Self {
            stages: Arc::new(Stages {
                extractor,
                scorer,
                encoder,
                skill_match_threshold: settings.scoring.skill_match_threshold,
            }),
            aggregator,
        })
    }

    pub fn extractor(&self) -> &FieldExtractor {
        &self.stages.extractor
    }

    pub fn scorer(&self) -> &SemanticScorer {
        &self.stages.scorer
    }

    pub async fn run(&self, job: &JobRequirement, documents: Vec<RawDocument>) -> Result<RunReport> {
        self.aggregator.check_capacity(documents.len())?;
        if documents.is_empty() {
            return Ok(RunReport { results: Vec::new(), diagnostics: RunDiagnostics::default() });
        }

        let job_embeddings = Arc::new(self.embed_job(job).await);
        let matcher = Arc::new(SkillMatcher::new(
            job.text_for(Category::Skills),
            self.stages.extractor.synonyms(),
            self.stages.skill_match_threshold,
        ));

        // One encoder call per category at most.
        let budget = self.stages.scorer.timeout() * Category::ALL.len() as u32;
        let mut ids = Vec::with_capacity(documents.len());
        let mut handles = Vec::with_capacity(documents.len());
        for doc in documents {
            ids.push(doc.id().to_string());
            let stages = Arc::clone(&self.stages);
            let job_embeddings = Arc::clone(&job_embeddings);
            let matcher = Arc::clone(&matcher);
            let handle = tokio::task::spawn_blocking(move || {
                stages.process(&doc, &job_embeddings, &matcher)
            });
            handles.push(timeout(budget, handle));
        }

        let mut diagnostics = RunDiagnostics { candidates: ids.len(), ..Default::default() };
        let mut outcomes = Vec::with_capacity(ids.len());
        for (id, waited) in ids.into_iter().zip(join_all(handles).await) {
            let joined = match waited {
                Ok(joined) => joined,
                Err(_) => {
                    // The blocking task keeps running detached; its result is dropped.
                    tracing::error!(candidate = %id, budget_ms = budget.as_millis() as u64, "candidate timed out");
                    diagnostics.failed_candidates += 1;
                    outcomes.push(CandidateOutcome::failed(id, timed_out(budget)));
                    continue;
                }
            };
            match joined {
                Ok(run) => {
                    diagnostics.chars_repaired += run.stats.chars_repaired;
                    diagnostics.placeholders += run.stats.placeholders;
                    diagnostics.categories_defaulted_empty += run.stats.empty_categories;
                    diagnostics.encoding_failures += run.stats.encoding_failures;
                    diagnostics.encoder_calls += run.stats.encoder_calls;
                    outcomes.push(run.outcome);
                }
                Err(e) => {
                    tracing::error!(candidate = %id, error = %e, "candidate task failed");
                    diagnostics.failed_candidates += 1;
                    outcomes.push(CandidateOutcome::failed(id, format!("processing failed: {e}")));
                }
            }
        }

        let results = self.aggregator.rank(outcomes)?;
        tracing::info!(
            candidates = diagnostics.candidates,
            failed = diagnostics.failed_candidates,
            encoding_failures = diagnostics.encoding_failures,
            chars_repaired = diagnostics.chars_repaired,
            categories_defaulted_empty = diagnostics.categories_defaulted_empty,
            "comparison run finished"
        );
        Ok(RunReport { results, diagnostics })
    }

    /// Encodes the job categories concurrently. A category whose call does
    /// not return within the encoder timeout is marked failed.
    async fn embed_job(&self, job: &JobRequirement) -> JobEmbeddings {
        let limit = self.stages.scorer.timeout();
        let job = Arc::new(job.clone());
        let tasks = Category::ALL.map(|category| {
            let stages = Arc::clone(&self.stages);
            let job = Arc::clone(&job);
            let handle = tokio::task::spawn_blocking(move || {
                stages.scorer.embed_job_category(category, &job, stages.encoder.as_ref())
            });
            timeout(limit, handle)
        });

        let mut embedded = join_all(tasks).await.into_iter();
        let categories = PerCategory::from_fn(|category| match embedded.next() {
            Some(Ok(Ok(embedding))) => embedding,
            Some(Ok(Err(e))) => {
                tracing::error!(%category, error = %e, "job requirement encoding task failed");
                JobEmbedding::Failed(format!("job encoding task failed: {e}"))
            }
            Some(Err(_)) | None => {
                tracing::warn!(%category, timeout_ms = limit.as_millis() as u64, "job requirement encoding timed out");
                JobEmbedding::Failed(timed_out(limit))
            }
        });
        JobEmbeddings { categories }
    }
}

fn timed_out(limit: Duration) -> String {
    format!("timed out after {}ms", limit.as_millis())
}

impl Stages {
    fn process(&self, doc: &RawDocument, job: &JobEmbeddings, matcher: &SkillMatcher) -> CandidateRun {
        let normalized = normalize(doc.text());
        let mut stats = CandidateStats {
            chars_repaired: normalized.stats.chars_repaired(),
            placeholders: normalized.stats.placeholders,
            ..Default::default()
        };

        let extraction = self.extractor.extract(&normalized.text);
        let profile = ProfileBuilder::new(self.extractor.synonyms()).build(doc, normalized, extraction);
        for category in Category::ALL.into_iter().filter(|c| profile.is_empty(*c)) {
            stats.empty_categories += 1;
            tracing::info!(candidate = %profile.id(), %category, "category defaulted to empty");
        }

        let scored = self.scorer.score_profile(&profile, job, self.encoder.as_ref());
        stats.encoder_calls = scored.encoder_calls;
        stats.encoding_failures = scored.failures.len();
        for (category, reason) in &scored.failures {
            tracing::warn!(candidate = %profile.id(), %category, %reason, "category score absent");
        }

        let (status, failure) = if scored.is_partial() {
            let reasons = scored
                .failures
                .iter()
                .map(|(c, r)| format!("{c}: {r}"))
                .collect::<Vec<_>>()
                .join("; ");
            (CandidateStatus::Partial, Some(reasons))
        } else {
            (CandidateStatus::Complete, None)
        };
        tracing::debug!(candidate = %profile.id(), ?status, "candidate scored");

        CandidateRun {
            outcome: CandidateOutcome {
                id: profile.id().to_string(),
                scores: scored.scores,
                confidence: *profile.confidence(),
                status,
                matched_skills: matcher.matched(profile.skills()),
                failure,
            },
            stats,
        }
    }
}
