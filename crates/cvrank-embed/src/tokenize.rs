use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// XLM-RoBERTa `<pad>` id, used when the tokenizer carries no padding config.
const DEFAULT_PAD_ID: u32 = 1;

/// One text as `[1, max_len]` model inputs.
pub struct TokenBatch {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    /// Tokens produced before truncation.
    pub token_count: usize,
}

impl TokenBatch {
    pub fn truncated(&self, max_len: usize) -> bool {
        self.token_count > max_len
    }
}

/// Tokenize `text`, then truncate or pad ids and mask to exactly `max_len`.
pub fn encode_padded(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<TokenBatch> {
    let encoding = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {e}"))?;
    let pad_id = tokenizer.get_padding().map_or(DEFAULT_PAD_ID, |p| p.pad_id);

    let token_count = encoding.get_ids().len();
    let mut ids = encoding.get_ids().to_vec();
    let mut mask = encoding.get_attention_mask().to_vec();
    ids.resize(max_len, pad_id);
    mask.resize(max_len, 0);

    Ok(TokenBatch {
        input_ids: Tensor::new(ids.as_slice(), device)?.unsqueeze(0)?,
        attention_mask: Tensor::new(mask.as_slice(), device)?.unsqueeze(0)?,
        token_count,
    })
}
