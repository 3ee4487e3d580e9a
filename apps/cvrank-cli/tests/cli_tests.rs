use std::fs;
use std::path::PathBuf;

use cvrank_cli::{collect_files, load_documents, load_job, parse_args, render_table};
use cvrank_core::types::{
    CandidateStatus, Category, CategoryScore, ComparisonResult, PerCategory, Confidence,
};
use cvrank_core::{RunDiagnostics, RunReport};

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn parses_job_sections_flags_and_inputs() {
    let parsed = parse_args(args(&[
        "--job", "job.txt", "--job-skills", "skills.txt", "--json", "a.txt", "dir",
    ]))
    .expect("valid arguments");
    assert_eq!(parsed.job, PathBuf::from("job.txt"));
    assert_eq!(parsed.job_sections, vec![(Category::Skills, PathBuf::from("skills.txt"))]);
    assert!(parsed.json);
    assert_eq!(parsed.inputs, vec![PathBuf::from("a.txt"), PathBuf::from("dir")]);
}

#[test]
fn missing_job_or_inputs_is_an_error() {
    assert!(parse_args(args(&["a.txt"])).is_err(), "--job is required");
    assert!(parse_args(args(&["--job", "job.txt"])).is_err(), "at least one candidate");
    assert!(parse_args(args(&["--job"])).is_err(), "flag without value");
    assert!(parse_args(args(&["--job", "j.txt", "--bogus", "a.txt"])).is_err());
}

#[test]
fn directories_expand_to_sorted_txt_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b.txt"), "B").unwrap();
    fs::write(dir.path().join("a.TXT"), "A").unwrap();
    fs::write(dir.path().join("notes.md"), "ignored").unwrap();

    let files = collect_files(&[dir.path().to_path_buf()]).unwrap();
    let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
    assert_eq!(names, vec!["a.TXT", "b.txt"]);
}

#[test]
fn documents_get_stem_ids_and_page_counts() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("alice.txt"), "page one\u{0C}page two").unwrap();
    fs::write(dir.path().join("bob.txt"), b"invalid \xFF byte").unwrap();

    let docs = load_documents(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id(), "alice");
    assert_eq!(docs[0].page_count(), 2);
    assert_eq!(docs[1].id(), "bob");
    assert_eq!(docs[1].decode_placeholders(), 1, "invalid byte is counted, not dropped");
}

#[test]
fn missing_candidate_path_is_an_error() {
    assert!(collect_files(&[PathBuf::from("/nonexistent/cvrank/input.txt")]).is_err());
}

#[test]
fn job_sections_override_description() {
    let dir = tempfile::tempdir().unwrap();
    let job_path = dir.path().join("job.txt");
    let skills_path = dir.path().join("skills.txt");
    fs::write(&job_path, "Backend developer").unwrap();
    fs::write(&skills_path, "Rust, PostgreSQL").unwrap();

    let parsed = parse_args(vec![
        "--job".to_string(),
        job_path.display().to_string(),
        "--job-skills".to_string(),
        skills_path.display().to_string(),
        "cand.txt".to_string(),
    ])
    .unwrap();
    let job = load_job(&parsed).unwrap();
    assert_eq!(job.text_for(Category::Skills), "Rust, PostgreSQL");
    assert_eq!(job.text_for(Category::Experience), "Backend developer");
}

#[test]
fn table_shows_absent_scores_and_flags() {
    let report = RunReport {
        results: vec![ComparisonResult {
            rank: 1,
            candidate_id: "carol".into(),
            scores: vec![
                CategoryScore::scored(Category::Experience, 0.8),
                CategoryScore::absent(Category::Education),
                CategoryScore::scored(Category::Skills, 0.4),
            ],
            aggregate: 0.52,
            confidence: PerCategory { experience: Confidence::High, education: Confidence::High, skills: Confidence::Low },
            status: CandidateStatus::Partial,
            matched_skills: vec!["rust".into()],
            failure: Some("education: Encoding failed: boom".into()),
        }],
        diagnostics: RunDiagnostics { candidates: 1, encoding_failures: 1, ..Default::default() },
    };
    let table = render_table(&report);
    assert!(table.contains("carol"));
    assert!(table.contains("n/a"), "absent score is visible: {table}");
    assert!(table.contains("PARTIAL"));
    assert!(table.contains("0.400*"), "low-confidence marker: {table}");
    assert!(table.contains("[Medium fit]"));
}
