use candle_core::{DType, Tensor};

use crate::model_err;
use pgrkam_core::{Error, Result};

/// Mean over unmasked tokens followed by L2 normalization.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]`; returns `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _tokens, hidden_dim) = hidden
        .dims3()
        .map_err(|e| Error::MalformedInput(format!("hidden states must be [B,T,H]: {e}")))?;

    let mask = attention_mask.to_device(hidden.device()).and_then(|m| m.to_dtype(hidden.dtype())).map_err(model_err)?;
    let mask_3d = mask.unsqueeze(2).and_then(|m| m.broadcast_as(hidden.shape())).map_err(model_err)?;
    let sum = hidden.mul(&mask_3d).and_then(|m| m.sum(1)).map_err(model_err)?;
    // An all-padding row would divide by zero; clamp its length to 1.
    let lengths = mask.sum_keepdim(1).and_then(|l| l.maximum(1.0)).map_err(model_err)?;
    let mean = sum.broadcast_div(&lengths).map_err(model_err)?;

    let eps = match hidden.dtype() { DType::F16 | DType::BF16 => 1e-6, _ => 1e-12 };
    let norm = mean.sqr().and_then(|s| s.sum_keepdim(1)).and_then(|s| s.sqrt()).and_then(|n| n.affine(1.0, eps)).map_err(model_err)?;
    let pooled = mean.broadcast_div(&norm).map_err(model_err)?;
    if pooled.dims() != [batch, hidden_dim] {
        return Err(Error::Operation(format!("pooled shape {:?} != [{batch}, {hidden_dim}]", pooled.dims())));
    }
    Ok(pooled)
}
