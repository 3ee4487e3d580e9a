//! Semantic encoders behind the core [`Embedder`] capability.

pub mod device;
pub mod hashing;
pub mod pool;
pub mod tokenize;

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use cvrank_core::config::{expand_path, EncoderBackend, EncoderConfig};
use cvrank_core::Embedder;
use tokenizers::Tokenizer;

pub use hashing::HashingEncoder;
pub use pool::{masked_mean_l2, sentence_vector};

/// Calls slower than this are logged.
const SLOW_EMBED_MS: u128 = 500;

/// Sentence encoder over a local XLM-RoBERTa checkpoint (e.g. BGE-M3):
/// masked mean pooling, L2 normalized.
pub struct XlmRobertaEncoder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
    dim: usize,
}

impl XlmRobertaEncoder {
    pub fn new(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = device::select_device();
        tracing::info!(dir = %model_dir.display(), "loading encoder model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        tracing::info!(dim = config.hidden_size, max_len, "encoder model loaded");

        Ok(Self { model, tokenizer, device, max_len, dim: config.hidden_size })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        return Ok(candle_core::pickle::read_all(&pickle)?.into_iter().collect());
    }
    Err(anyhow!("No model weights found in {}", model_dir.display()))
}

impl Embedder for XlmRobertaEncoder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let batch = tokenize::encode_padded(&self.tokenizer, text, self.max_len, &self.device)?;
        if batch.truncated(self.max_len) {
            tracing::debug!(tokens = batch.token_count, max_len = self.max_len, "input truncated");
        }
        let token_type_ids = batch.input_ids.zeros_like()?;
        let hidden = self.model.forward(
            &batch.input_ids,
            &batch.attention_mask,
            &token_type_ids,
            None,
            None,
            None,
        )?;
        let emb = pool::sentence_vector(&hidden, &batch.attention_mask, self.dim)?;
        let elapsed = start.elapsed().as_millis();
        if elapsed > SLOW_EMBED_MS {
            tracing::warn!(elapsed_ms = elapsed as u64, chars = text.len(), "slow embedding");
        }
        Ok(emb)
    }

    fn id(&self) -> String {
        format!("xlm_roberta:d{}", self.dim)
    }
}

/// Build the encoder selected by configuration. `APP_USE_FAKE_EMBEDDINGS=1`
/// forces the hashing encoder regardless of the configured backend.
pub fn get_default_embedder(config: &EncoderConfig) -> Result<Arc<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if use_fake || config.backend == EncoderBackend::Hashing {
        tracing::info!(dim = config.dim, "using hashing encoder");
        return Ok(Arc::new(HashingEncoder::new(config.dim)?));
    }
    let model_dir = resolve_model_dir(config.model_dir.as_deref())?;
    Ok(Arc::new(XlmRobertaEncoder::new(&model_dir, config.max_len)?))
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() {
            return Ok(p);
        }
        return Err(anyhow!("Configured model directory does not exist: {}", p.display()));
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = expand_path(&dir);
            if p.exists() {
                tracing::debug!(var, dir = %p.display(), "model directory from environment");
                return Ok(p);
            }
        }
    }
    let local = Path::new("models/bge-m3");
    if local.exists() {
        return Ok(local.to_path_buf());
    }
    Err(anyhow!("Could not locate encoder model directory; set encoder.model_dir or APP_MODEL_DIR"))
}
