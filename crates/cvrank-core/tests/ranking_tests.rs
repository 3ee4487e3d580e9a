use cvrank_core::ranking::{CandidateOutcome, RankingAggregator};
use cvrank_core::report::{summarize, FitBand};
use cvrank_core::types::{CandidateStatus, Category, CategoryScore, PerCategory};
use cvrank_core::Error;

fn weights() -> PerCategory<f64> {
    PerCategory { experience: 0.5, education: 0.2, skills: 0.3 }
}

fn outcome(id: &str, e: f32, d: f32, s: f32) -> CandidateOutcome {
    CandidateOutcome {
        id: id.to_string(),
        scores: vec![
            CategoryScore::scored(Category::Experience, e),
            CategoryScore::scored(Category::Education, d),
            CategoryScore::scored(Category::Skills, s),
        ],
        confidence: PerCategory::default(),
        status: CandidateStatus::Complete,
        matched_skills: Vec::new(),
        failure: None,
    }
}

#[test]
fn sorts_by_aggregate_and_assigns_one_based_ranks() {
    let aggregator = RankingAggregator::new(weights(), 20);
    let results = aggregator
        .rank(vec![outcome("low", 0.1, 0.1, 0.1), outcome("high", 0.9, 0.8, 0.9), outcome("mid", 0.5, 0.5, 0.5)])
        .unwrap();

    let order: Vec<(usize, &str)> = results.iter().map(|r| (r.rank, r.candidate_id.as_str())).collect();
    assert_eq!(order, vec![(1, "high"), (2, "mid"), (3, "low")]);
    assert!((results[0].aggregate - 0.88).abs() < 1e-5);
}

#[test]
fn ties_are_broken_by_candidate_id() {
    let aggregator = RankingAggregator::new(weights(), 20);
    let results = aggregator
        .rank(vec![outcome("zed", 0.4, 0.4, 0.4), outcome("amy", 0.4, 0.4, 0.4), outcome("kim", 0.4, 0.4, 0.4)])
        .unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.candidate_id.as_str()).collect();
    assert_eq!(ids, vec!["amy", "kim", "zed"]);
}

#[test]
fn ranking_is_deterministic() {
    let aggregator = RankingAggregator::new(weights(), 20);
    let batch = || {
        (0..15)
            .map(|i| outcome(&format!("c{i:02}"), (i % 4) as f32 / 4.0, 0.5, (i % 3) as f32 / 3.0))
            .collect::<Vec<_>>()
    };
    let first: Vec<_> = aggregator.rank(batch()).unwrap().into_iter().map(|r| (r.rank, r.candidate_id)).collect();
    let second: Vec<_> = aggregator.rank(batch()).unwrap().into_iter().map(|r| (r.rank, r.candidate_id)).collect();
    assert_eq!(first, second);
}

#[test]
fn more_than_max_candidates_is_capacity_error() {
    let aggregator = RankingAggregator::new(weights(), 20);
    let batch: Vec<_> = (0..21).map(|i| outcome(&format!("c{i}"), 0.5, 0.5, 0.5)).collect();
    match aggregator.rank(batch) {
        Err(Error::Capacity { requested, max }) => assert_eq!((requested, max), (21, 20)),
        other => panic!("expected capacity error, got {other:?}"),
    }
    assert!(aggregator.check_capacity(20).is_ok());
}

#[test]
fn failed_candidate_is_kept_with_zero_aggregate() {
    let aggregator = RankingAggregator::new(weights(), 20);
    let results = aggregator
        .rank(vec![CandidateOutcome::failed("aaa", "boom"), outcome("bob", 0.2, 0.0, 0.0)])
        .unwrap();
    assert_eq!(results[1].candidate_id, "aaa");
    assert_eq!(results[1].status, CandidateStatus::Failed);
    assert_eq!(results[1].aggregate, 0.0);
    assert!(results[1].scores.iter().all(|s| s.value.is_none()));
    assert_eq!(results[1].failure.as_deref(), Some("boom"));
}

#[test]
fn failed_candidate_ties_with_zero_scores_by_id() {
    let aggregator = RankingAggregator::new(weights(), 20);
    let results = aggregator
        .rank(vec![outcome("bob", 0.0, 0.0, 0.0), CandidateOutcome::failed("aaa", "boom")])
        .unwrap();
    let order: Vec<(usize, &str, CandidateStatus)> =
        results.iter().map(|r| (r.rank, r.candidate_id.as_str(), r.status)).collect();
    assert_eq!(
        order,
        vec![(1, "aaa", CandidateStatus::Failed), (2, "bob", CandidateStatus::Complete)],
        "status plays no part in the order"
    );
}

#[test]
fn report_lines_band_and_flag_results() {
    let aggregator = RankingAggregator::new(weights(), 20);
    let mut partial = outcome("p", 0.6, 0.6, 0.6);
    partial.status = CandidateStatus::Partial;
    partial.scores[0] = CategoryScore::absent(Category::Experience);
    partial.matched_skills = (0..12).map(|i| format!("skill{i}")).collect();

    let results = aggregator.rank(vec![outcome("h", 0.9, 0.9, 0.9), partial]).unwrap();
    let lines = summarize(&results);

    assert_eq!(lines[0].band, FitBand::High);
    assert_eq!(lines[0].experience_pct, Some(90));
    assert_eq!(lines[1].band, FitBand::Low, "0.3 aggregate without experience");
    assert_eq!(lines[1].experience_pct, None);
    assert_eq!(lines[1].matched_skills.len(), 10, "at most ten skills listed");
    assert!(lines[1].flags.contains(&"partial".to_string()));
    assert!(lines[1].to_string().contains("experience match n/a"));

    assert_eq!(FitBand::for_score(0.75), FitBand::Medium);
    assert_eq!(FitBand::for_score(0.5), FitBand::Low);
}
