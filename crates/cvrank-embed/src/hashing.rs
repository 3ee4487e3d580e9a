use std::hash::{Hash, Hasher};

use anyhow::{bail, Result};
use cvrank_core::Embedder;
use twox_hash::XxHash64;

/// Deterministic hashed bag-of-words encoder. Texts sharing words get a
/// positive cosine; texts sharing none are (almost always) orthogonal.
/// Needs no model files, so it backs tests and offline runs.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dim: usize,
}

impl HashingEncoder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            bail!("hashing encoder dimension must be positive");
        }
        Ok(Self { dim })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

impl Embedder for HashingEncoder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        for token in tokens(text) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            // Weight in [0.5, 1.0] so a shared token always counts.
            let val = 0.5 + 0.5 * (((h >> 32) as u32) as f32 / u32::MAX as f32);
            v[idx] += val;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }

    fn id(&self) -> String {
        format!("hashing:d{}", self.dim)
    }
}
