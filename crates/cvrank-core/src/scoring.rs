//! Semantic scorer: per-category cosine similarity between a candidate
//! profile and a job requirement, plus the weighted aggregate.
//!
//! The per-category breakdown is the primary output. Categories are never
//! merged before they are scored.

use std::collections::{BTreeSet, HashSet};
use std::time::{Duration, Instant};

use crate::config::{validate_weights, ScoringConfig};
use crate::error::{Error, Result};
use crate::extract::skills::{self, SynonymTable};
use crate::normalize::fold;
use crate::traits::Embedder;
use crate::types::{CandidateProfile, Category, CategoryScore, JobRequirement, PerCategory};

/// Cosine similarity with negative values clamped to zero. Zero vectors,
/// mismatched lengths and non-finite results all give 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let cos = dot / (norm_a * norm_b);
    if cos.is_finite() { cos.clamp(0.0, 1.0) } else { 0.0 }
}

/// Weighted sum of category scores. Absent scores contribute nothing.
pub fn aggregate(scores: &[CategoryScore], weights: &PerCategory<f64>) -> f32 {
    let total: f64 = scores
        .iter()
        .map(|s| weights.get(s.category) * f64::from(s.value.unwrap_or(0.0)))
        .sum();
    if total.is_finite() { total.clamp(0.0, 1.0) as f32 } else { 0.0 }
}

/// Job-side vector of one category.
#[derive(Debug, Clone)]
pub enum JobEmbedding {
    /// Nothing left to compare against after text preparation.
    Empty,
    Vector(Vec<f32>),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct JobEmbeddings {
    pub categories: PerCategory<JobEmbedding>,
}

/// Scores of one candidate plus the encoder failures behind absent values.
#[derive(Debug, Clone, Default)]
pub struct ProfileScores {
    pub scores: Vec<CategoryScore>,
    pub failures: Vec<(Category, String)>,
    pub encoder_calls: usize,
}

impl ProfileScores {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SemanticScorer {
    weights: PerCategory<f64>,
    exponent: f64,
    stopwords: HashSet<String>,
    timeout: Duration,
}

impl SemanticScorer {
    pub fn new(config: &ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            weights: config.weights,
            exponent: config.similarity_exponent,
            stopwords: config.stopwords.iter().map(|w| fold(w)).collect(),
            timeout: Duration::from_millis(config.encode_timeout_ms),
        })
    }

    /// Replace the category weights. Fails when they do not sum to 1.0.
    pub fn with_weights(mut self, weights: PerCategory<f64>) -> Result<Self> {
        validate_weights(&weights)?;
        self.weights = weights;
        Ok(self)
    }

    pub fn weights(&self) -> &PerCategory<f64> {
        &self.weights
    }

    /// Lower-case, strip punctuation (keeping `+` and `#`), and drop
    /// stopwords and one-letter tokens other than `c` and `r`.
    pub fn prepare_text(&self, text: &str) -> String {
        text.to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '+' || c == '#' { c } else { ' ' })
            .collect::<String>()
            .split_whitespace()
            .filter(|w| {
                let single = w.chars().count() == 1;
                (!single || *w == "c" || *w == "r") && !self.stopwords.contains(&fold(w))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Time budget of a single encoder call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn embed_job(&self, job: &JobRequirement, encoder: &dyn Embedder) -> JobEmbeddings {
        let categories = PerCategory::from_fn(|category| self.embed_job_category(category, job, encoder));
        JobEmbeddings { categories }
    }

    pub fn embed_job_category(
        &self,
        category: Category,
        job: &JobRequirement,
        encoder: &dyn Embedder,
    ) -> JobEmbedding {
        let prepared = self.prepare_text(job.text_for(category));
        if prepared.is_empty() {
            return JobEmbedding::Empty;
        }
        match self.timed_embed(encoder, &prepared) {
            Ok(v) => JobEmbedding::Vector(v),
            Err(e) => {
                tracing::warn!(%category, error = %e, "job requirement could not be encoded");
                JobEmbedding::Failed(e.to_string())
            }
        }
    }

    pub fn score_profile(
        &self,
        profile: &CandidateProfile,
        job: &JobEmbeddings,
        encoder: &dyn Embedder,
    ) -> ProfileScores {
        let mut out = ProfileScores::default();
        for category in Category::ALL {
            let score = if profile.is_empty(category) {
                CategoryScore::scored(category, 0.0)
            } else {
                let text = profile.category_text(category);
                self.score_category(category, &text, job.categories.get(category), encoder, &mut out)
            };
            out.scores.push(score);
        }
        out
    }

    fn score_category(
        &self,
        category: Category,
        text: &str,
        job: &JobEmbedding,
        encoder: &dyn Embedder,
        out: &mut ProfileScores,
    ) -> CategoryScore {
        let prepared = self.prepare_text(text);
        if prepared.is_empty() {
            return CategoryScore::scored(category, 0.0);
        }
        let job_vector = match job {
            JobEmbedding::Empty => return CategoryScore::scored(category, 0.0),
            JobEmbedding::Failed(reason) => {
                out.failures.push((category, format!("job requirement: {reason}")));
                return CategoryScore::absent(category);
            }
            JobEmbedding::Vector(v) => v,
        };

        out.encoder_calls += 1;
        match self.timed_embed(encoder, &prepared) {
            Ok(v) if v.len() != job_vector.len() => {
                out.failures.push((
                    category,
                    format!("dimension mismatch: {} vs {}", v.len(), job_vector.len()),
                ));
                CategoryScore::absent(category)
            }
            Ok(v) => CategoryScore::scored(category, self.sharpen(cosine_similarity(&v, job_vector))),
            Err(e) => {
                out.failures.push((category, e.to_string()));
                CategoryScore::absent(category)
            }
        }
    }

    pub fn aggregate(&self, scores: &[CategoryScore]) -> f32 {
        aggregate(scores, &self.weights)
    }

    fn sharpen(&self, similarity: f32) -> f32 {
        if (self.exponent - 1.0).abs() < f64::EPSILON {
            similarity
        } else {
            f64::from(similarity).powf(self.exponent) as f32
        }
    }

    /// An encoder call that outlives the timeout is reported as a failure
    /// even if it eventually returned a vector. The pipeline stops waiting
    /// on stalled calls; this covers direct use of the scorer.
    fn timed_embed(&self, encoder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let vector = encoder.embed(text).map_err(|e| Error::Encoding(e.to_string()))?;
        let elapsed = start.elapsed();
        if elapsed > self.timeout {
            return Err(Error::Encoding(format!(
                "encoder took {}ms, limit is {}ms",
                elapsed.as_millis(),
                self.timeout.as_millis()
            )));
        }
        if vector.is_empty() || vector.iter().any(|x| !x.is_finite()) {
            return Err(Error::Encoding("encoder returned an empty or non-finite vector".into()));
        }
        Ok(vector)
    }
}

/// Reports which candidate skills the job asks for: exact term match,
/// containment as a phrase of the job text, or edit-distance similarity at
/// or above the threshold. Does not affect the cosine score.
#[derive(Debug, Clone)]
pub struct SkillMatcher {
    terms: BTreeSet<String>,
    threshold: f64,
}

/// Longest job-text phrase considered a skill term.
const MAX_PHRASE_WORDS: usize = 3;
/// Fuzzy matching is skipped for very short terms like "go" or "c".
const MIN_FUZZY_CHARS: usize = 4;

impl SkillMatcher {
    pub fn new(job_skills_text: &str, synonyms: &SynonymTable, threshold: f64) -> Self {
        let mut terms: BTreeSet<String> = skills::extract_skills(job_skills_text, synonyms);

        let cleaned: String = fold(job_skills_text)
            .chars()
            .map(|c| if c.is_alphanumeric() || "+#.".contains(c) { c } else { ' ' })
            .collect();
        let words: Vec<&str> = cleaned.split_whitespace().map(|w| w.trim_end_matches('.')).collect();
        for n in 1..=MAX_PHRASE_WORDS {
            for window in words.windows(n) {
                if let Some(term) = skills::normalize_term(&window.join(" "), synonyms) {
                    terms.insert(term);
                }
            }
        }
        Self { terms, threshold }
    }

    pub fn matches(&self, skill: &str) -> bool {
        if self.terms.contains(skill) {
            return true;
        }
        if skill.chars().count() < MIN_FUZZY_CHARS {
            return false;
        }
        self.terms
            .iter()
            .filter(|t| t.chars().count() >= MIN_FUZZY_CHARS)
            .any(|t| strsim::normalized_levenshtein(skill, t) >= self.threshold)
    }

    pub fn matched<'a>(&self, skills: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        skills.into_iter().filter(|s| self.matches(s)).cloned().collect()
    }
}
