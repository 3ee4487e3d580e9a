#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cvrank_core::config::ExtractionConfig;
use cvrank_core::extract::FieldExtractor;
use cvrank_core::normalize::normalize;
use cvrank_core::profile::ProfileBuilder;
use cvrank_core::types::{CandidateProfile, RawDocument};
use cvrank_core::Embedder;

pub const DIM: usize = 256;

/// Deterministic bag-of-words encoder that counts its calls and can be told
/// to fail, panic or stall on texts containing a marker word.
#[derive(Default)]
pub struct StubEmbedder {
    calls: AtomicUsize,
    pub fail_on: Option<&'static str>,
    pub panic_on: Option<&'static str>,
    pub delay: Option<Duration>,
    /// Restricts `delay` to texts containing this marker.
    pub stall_on: Option<&'static str>,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: &'static str) -> Self {
        Self { fail_on: Some(marker), ..Self::default() }
    }

    pub fn panicking_on(marker: &'static str) -> Self {
        Self { panic_on: Some(marker), ..Self::default() }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::default() }
    }

    pub fn stalling_on(marker: &'static str, delay: Duration) -> Self {
        Self { delay: Some(delay), stall_on: Some(marker), ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf29ce484222325u64, |h, b| (h ^ u64::from(b)).wrapping_mul(0x100000001b3))
}

impl Embedder for StubEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            if self.stall_on.map_or(true, |m| text.contains(m)) {
                std::thread::sleep(delay);
            }
        }
        if self.fail_on.is_some_and(|m| text.contains(m)) {
            anyhow::bail!("stub encoder refused input");
        }
        if self.panic_on.is_some_and(|m| text.contains(m)) {
            panic!("stub encoder crashed");
        }
        let mut v = vec![0f32; DIM];
        for word in text.split_whitespace() {
            v[(fnv1a(word) % DIM as u64) as usize] += 1.0;
        }
        Ok(v)
    }

    fn id(&self) -> String {
        "stub".to_string()
    }
}

pub fn build_profile(id: &str, text: &str) -> CandidateProfile {
    let extractor = FieldExtractor::new(&ExtractionConfig::default()).expect("default config");
    let doc = RawDocument::new(id, text, 1);
    let normalized = normalize(doc.text());
    let extraction = extractor.extract(&normalized.text);
    ProfileBuilder::new(extractor.synonyms()).build(&doc, normalized, extraction)
}

pub const JOB: &str = "Looking for a developer with Python and cloud experience";

pub const EXAMPLE_RESUME: &str = "Experience\n5 years as a software developer\n\nSkills\nPython, AWS";
