mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{StubEmbedder, EXAMPLE_RESUME, JOB};
use cvrank_core::config::Settings;
use cvrank_core::types::{CandidateStatus, Category, JobRequirement, PerCategory, RawDocument};
use cvrank_core::{Error, Pipeline};

fn pipeline(encoder: Arc<StubEmbedder>) -> Pipeline {
    Pipeline::new(Settings::default(), encoder).expect("default settings are valid")
}

fn pipeline_with_timeout(encoder: Arc<StubEmbedder>, encode_timeout_ms: u64) -> Pipeline {
    let mut settings = Settings::default();
    settings.scoring.encode_timeout_ms = encode_timeout_ms;
    Pipeline::new(settings, encoder).expect("valid settings")
}

fn doc(id: &str, text: &str) -> RawDocument {
    RawDocument::new(id, text, 1)
}

#[tokio::test]
async fn twenty_one_candidates_fail_before_any_work() {
    let encoder = Arc::new(StubEmbedder::new());
    let pipeline = pipeline(encoder.clone());
    let docs: Vec<_> = (0..21).map(|i| doc(&format!("c{i}"), EXAMPLE_RESUME)).collect();

    let err = pipeline.run(&JobRequirement::new(JOB), docs).await.unwrap_err();
    assert!(matches!(err, Error::Capacity { requested: 21, max: 20 }));
    assert_eq!(encoder.calls(), 0, "nothing was extracted or encoded");
}

#[tokio::test]
async fn empty_batch_returns_empty_results() {
    let encoder = Arc::new(StubEmbedder::new());
    let report = pipeline(encoder.clone()).run(&JobRequirement::new(JOB), Vec::new()).await.unwrap();
    assert!(report.results.is_empty());
    assert_eq!(encoder.calls(), 0);
}

#[tokio::test]
async fn invalid_weights_abort_before_the_run() {
    let mut settings = Settings::default();
    settings.scoring.weights = PerCategory { experience: 0.5, education: 0.2, skills: 0.25 };
    let result = Pipeline::new(settings, Arc::new(StubEmbedder::new()));
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[tokio::test]
async fn ranks_candidates_with_per_category_breakdown() {
    let encoder = Arc::new(StubEmbedder::new());
    let docs = vec![
        doc("nurse", "Experience\nRegistered nurse at City Hospital\n2015 - 2020\n\nSkills\nTriage, Patient care"),
        doc("dev", EXAMPLE_RESUME),
    ];
    let report = pipeline(encoder).run(&JobRequirement::new(JOB), docs).await.unwrap();

    assert_eq!(report.results.len(), 2);
    let top = &report.results[0];
    assert_eq!((top.rank, top.candidate_id.as_str()), (1, "dev"));
    assert!(top.aggregate > 0.0 && top.aggregate < 1.0);
    assert!(top.score(Category::Skills).unwrap() > 0.0);
    assert!(top.score(Category::Experience).unwrap() > 0.0);
    assert_eq!(top.score(Category::Education), Some(0.0));
    assert_eq!(top.matched_skills, vec!["python"]);
    assert_eq!(top.status, CandidateStatus::Complete);
    assert_eq!(report.results[1].rank, 2);

    assert_eq!(report.diagnostics.candidates, 2);
    assert_eq!(report.diagnostics.categories_defaulted_empty, 2, "no Education in either résumé");
}

#[tokio::test]
async fn missing_headings_score_zero_without_encoder_calls() {
    let encoder = Arc::new(StubEmbedder::new());
    let report = pipeline(encoder.clone())
        .run(&JobRequirement::new(JOB), vec![doc("blank", "Jane Doe\n+1 555 0100")])
        .await
        .unwrap();

    let row = &report.results[0];
    for category in Category::ALL {
        assert_eq!(row.score(category), Some(0.0), "{category} is empty and scores exactly 0");
    }
    assert_eq!(row.aggregate, 0.0);
    assert_eq!(encoder.calls(), 3, "only the job requirement was encoded");
    assert_eq!(report.diagnostics.encoder_calls, 0);
}

#[tokio::test]
async fn encoder_failure_is_isolated_to_one_candidate() {
    let encoder = Arc::new(StubEmbedder::failing_on("fortran"));
    let docs = vec![
        doc("old", "Experience\nDeveloper at Initech\n1990 - 1999\n\nSkills\nFortran, Python"),
        doc("new", EXAMPLE_RESUME),
    ];
    let report = pipeline(encoder).run(&JobRequirement::new(JOB), docs).await.unwrap();

    let old = report.results.iter().find(|r| r.candidate_id == "old").unwrap();
    assert_eq!(old.status, CandidateStatus::Partial);
    assert_eq!(old.score(Category::Skills), None, "failed category is absent, not zero");
    assert!(old.score(Category::Experience).is_some());
    assert!(old.failure.as_deref().unwrap_or_default().contains("skills"));

    let new = report.results.iter().find(|r| r.candidate_id == "new").unwrap();
    assert_eq!(new.status, CandidateStatus::Complete);
    assert_eq!(report.diagnostics.encoding_failures, 1);
}

#[tokio::test]
async fn panicking_candidate_becomes_failed_row() {
    let encoder = Arc::new(StubEmbedder::panicking_on("cobol"));
    let docs = vec![
        doc("crash", "Skills\nCOBOL, Python"),
        doc("fine", EXAMPLE_RESUME),
    ];
    let report = pipeline(encoder).run(&JobRequirement::new(JOB), docs).await.unwrap();

    assert_eq!(report.results.len(), 2, "the table still renders for every candidate");
    let crash = report.results.iter().find(|r| r.candidate_id == "crash").unwrap();
    assert_eq!(crash.status, CandidateStatus::Failed);
    assert_eq!(crash.rank, 2);
    assert!(crash.scores.iter().all(|s| s.value.is_none()));
    assert_eq!(report.diagnostics.failed_candidates, 1);

    let fine = report.results.iter().find(|r| r.candidate_id == "fine").unwrap();
    assert_eq!(fine.status, CandidateStatus::Complete);
}

#[tokio::test]
async fn same_batch_gives_same_ranking() {
    let pipeline = pipeline(Arc::new(StubEmbedder::new()));
    let job = JobRequirement::new(JOB);
    let batch = || {
        vec![
            doc("b", EXAMPLE_RESUME),
            doc("a", EXAMPLE_RESUME),
            doc("c", "Skills\nPython, Cloud, Developer tools"),
            doc("d", "Education\nState University\nBachelor of Science, 2012"),
        ]
    };

    let first = pipeline.run(&job, batch()).await.unwrap();
    let second = pipeline.run(&job, batch()).await.unwrap();
    let key = |r: &cvrank_core::RunReport| {
        r.results.iter().map(|c| (c.rank, c.candidate_id.clone(), c.aggregate)).collect::<Vec<_>>()
    };
    assert_eq!(key(&first), key(&second));

    let ids: Vec<_> = first.results.iter().map(|r| r.candidate_id.as_str()).collect();
    let a = ids.iter().position(|id| *id == "a").unwrap();
    let b = ids.iter().position(|id| *id == "b").unwrap();
    assert!(a < b, "identical scores fall back to id order");
}

#[tokio::test]
async fn stalled_candidate_does_not_hold_back_the_batch() {
    let encoder = Arc::new(StubEmbedder::stalling_on("cobol", Duration::from_millis(1500)));
    let docs = vec![doc("stuck", "Skills\nCOBOL, Python"), doc("fine", EXAMPLE_RESUME)];

    let started = Instant::now();
    let report = pipeline_with_timeout(encoder, 100).run(&JobRequirement::new(JOB), docs).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(1000), "run waited {elapsed:?} for a stalled encoder");
    let stuck = report.results.iter().find(|r| r.candidate_id == "stuck").unwrap();
    assert_eq!(stuck.status, CandidateStatus::Failed);
    assert!(stuck.failure.as_deref().unwrap_or_default().contains("timed out"));
    let fine = report.results.iter().find(|r| r.candidate_id == "fine").unwrap();
    assert_eq!(fine.status, CandidateStatus::Complete);
    assert_eq!((fine.rank, stuck.rank), (1, 2));
    assert_eq!(report.diagnostics.failed_candidates, 1);
}

#[tokio::test]
async fn stalled_job_encoding_leaves_categories_absent() {
    let encoder = Arc::new(StubEmbedder::with_delay(Duration::from_millis(1500)));

    let started = Instant::now();
    let report = pipeline_with_timeout(encoder, 50)
        .run(&JobRequirement::new(JOB), vec![doc("dev", EXAMPLE_RESUME)])
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(1000), "run waited {elapsed:?} for the job encoder");
    let row = &report.results[0];
    assert_eq!(row.status, CandidateStatus::Partial);
    assert_eq!(row.score(Category::Experience), None);
    assert_eq!(row.score(Category::Skills), None);
    assert_eq!(row.score(Category::Education), Some(0.0), "empty category needs no job vector");
    assert!(row.failure.as_deref().unwrap_or_default().contains("timed out"));
    assert_eq!(report.diagnostics.encoder_calls, 0);
}
