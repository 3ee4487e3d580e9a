use anyhow::{bail, Result};
use candle_core::{DType, Device, Tensor};

fn norm_floor(dtype: DType) -> f64 {
    match dtype {
        DType::F16 | DType::BF16 => 1e-6,
        _ => 1e-12,
    }
}

/// Mean over unmasked tokens followed by L2 normalization.
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]`; returns `[B, H]`.
/// A row with no unmasked token pools to zeros.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, width) = match hidden.dims() {
        [b, t, h] => (*b, *t, *h),
        dims => bail!("hidden shape must be [B,T,H], got {dims:?}"),
    };
    if attention_mask.dims() != [batch, tokens] {
        bail!("attention mask shape {:?} does not match [{batch}, {tokens}]", attention_mask.dims());
    }

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&mask.unsqueeze(2)?)?.sum(1)?;
    let counts = mask.sum_keepdim(1)?.maximum(1.0)?;
    let mean = summed.broadcast_div(&counts)?;
    let norms = mean.sqr()?.sum_keepdim(1)?.sqrt()?.maximum(norm_floor(hidden.dtype()))?;
    let pooled = mean.broadcast_div(&norms)?;

    if pooled.dims() != [batch, width] {
        bail!("pooled shape {:?} is not [{batch}, {width}]", pooled.dims());
    }
    Ok(pooled)
}

/// Pool a single-text forward pass into one sentence vector of the model's
/// hidden size.
pub fn sentence_vector(hidden: &Tensor, attention_mask: &Tensor, hidden_size: usize) -> Result<Vec<f32>> {
    match hidden.dims() {
        [1, _, h] if *h == hidden_size => {}
        dims => bail!("expected hidden state [1, T, {hidden_size}], got {dims:?}"),
    }
    let pooled = masked_mean_l2(hidden, attention_mask)?;
    Ok(pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.squeeze(0)?.to_vec1()?)
}
