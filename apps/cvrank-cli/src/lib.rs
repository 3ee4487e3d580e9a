//! Argument parsing, document loading and table rendering for the `cvrank`
//! binary.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use walkdir::WalkDir;

use cvrank_core::report::summarize;
use cvrank_core::types::{CandidateStatus, Category, ComparisonResult, Confidence, JobRequirement, RawDocument};
use cvrank_core::RunReport;

pub const USAGE: &str = "Usage: cvrank --job <FILE> [--job-experience <FILE>] [--job-education <FILE>] \
[--job-skills <FILE>] [--config <FILE>] [--json] <CANDIDATE_FILE|DIR>...";

/// Page separator written by most PDF-to-text converters.
const FORM_FEED: char = '\u{0C}';

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub job: PathBuf,
    pub job_sections: Vec<(Category, PathBuf)>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub inputs: Vec<PathBuf>,
}

pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<CliArgs> {
    let mut job = None;
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| anyhow!("{flag} needs a value"));
        match arg.as_str() {
            "--job" => job = Some(PathBuf::from(value("--job")?)),
            "--job-experience" => parsed
                .job_sections
                .push((Category::Experience, PathBuf::from(value("--job-experience")?))),
            "--job-education" => parsed
                .job_sections
                .push((Category::Education, PathBuf::from(value("--job-education")?))),
            "--job-skills" => parsed
                .job_sections
                .push((Category::Skills, PathBuf::from(value("--job-skills")?))),
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--json" => parsed.json = true,
            flag if flag.starts_with("--") => bail!("Unknown option: {flag}"),
            path => parsed.inputs.push(PathBuf::from(path)),
        }
    }

    parsed.job = job.ok_or_else(|| anyhow!("--job is required"))?;
    if parsed.inputs.is_empty() {
        bail!("no candidate files given");
    }
    Ok(parsed)
}

pub fn load_job(args: &CliArgs) -> Result<JobRequirement> {
    let read = |p: &Path| {
        std::fs::read_to_string(p).with_context(|| format!("Failed to read job file {}", p.display()))
    };
    let mut job = JobRequirement::new(read(&args.job)?);
    for (category, path) in &args.job_sections {
        job = job.with_section(*category, read(path)?);
    }
    Ok(job)
}

/// Expand directories into their `.txt` files, in path order.
pub fn collect_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("txt")))
                .collect();
            found.sort();
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            bail!("Candidate path not found: {}", input.display());
        }
    }
    Ok(files)
}

/// Read candidate files as documents. The id is the file stem, or the full
/// path when two files share a stem.
pub fn load_documents(inputs: &[PathBuf]) -> Result<Vec<RawDocument>> {
    let files = collect_files(inputs)?;
    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} résumés {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut seen = HashSet::new();
    let mut docs = Vec::with_capacity(files.len());
    for path in &files {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let id = if seen.insert(stem.clone()) { stem } else { path.display().to_string() };
        docs.push(RawDocument::from_bytes(id, &bytes, page_count(&bytes)));
        pb.inc(1);
    }
    pb.finish_and_clear();
    tracing::info!(documents = docs.len(), "loaded candidate documents");
    Ok(docs)
}

fn page_count(bytes: &[u8]) -> u32 {
    let breaks = bytes.iter().filter(|b| **b == FORM_FEED as u8).count();
    u32::try_from(breaks + 1).unwrap_or(u32::MAX)
}

fn cell(result: &ComparisonResult, category: Category) -> String {
    let low = *result.confidence.get(category) == Confidence::Low;
    match result.score(category) {
        Some(v) => format!("{:.3}{}", v, if low { "*" } else { "" }),
        None => "n/a".to_string(),
    }
}

/// Ranked table followed by one summary line per candidate and the run
/// diagnostics. `*` marks a low-confidence category.
pub fn render_table(report: &RunReport) -> String {
    let mut out = String::new();
    let width = report
        .results
        .iter()
        .map(|r| r.candidate_id.chars().count())
        .max()
        .unwrap_or(0)
        .max("Candidate".len());

    let _ = writeln!(
        out,
        "{:>4}  {:<width$}  {:>10}  {:>10}  {:>10}  {:>9}  {}",
        "Rank", "Candidate", "Experience", "Education", "Skills", "Aggregate", "Status"
    );
    for r in &report.results {
        let status = match r.status {
            CandidateStatus::Complete => "complete",
            CandidateStatus::Partial => "PARTIAL",
            CandidateStatus::Failed => "FAILED",
        };
        let _ = writeln!(
            out,
            "{:>4}  {:<width$}  {:>10}  {:>10}  {:>10}  {:>9.3}  {}",
            r.rank,
            r.candidate_id,
            cell(r, Category::Experience),
            cell(r, Category::Education),
            cell(r, Category::Skills),
            r.aggregate,
            status
        );
    }

    if !report.results.is_empty() {
        out.push('\n');
        for line in summarize(&report.results) {
            let _ = writeln!(out, "{line}");
        }
    }

    let d = &report.diagnostics;
    let _ = writeln!(
        out,
        "\n{} candidates, {} characters repaired, {} categories empty, {} encoding failures, {} failed",
        d.candidates, d.chars_repaired, d.categories_defaulted_empty, d.encoding_failures, d.failed_candidates
    );
    out
}
