use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use crate::model_err;
use pgrkam_core::Result;

/// Pad id for the loaded vocabulary: `<pad>` (sentencepiece) or `[PAD]` (wordpiece).
pub fn pad_id(tokenizer: &Tokenizer) -> u32 {
    tokenizer.token_to_id("<pad>").or_else(|| tokenizer.token_to_id("[PAD]")).unwrap_or(0)
}

/// Encode a batch into `[B, T]` id and mask tensors.
///
/// Sequences are truncated to `max_len` and right-padded to the longest
/// sequence in the batch.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let pad = pad_id(tokenizer);
    let mut rows: Vec<(Vec<u32>, Vec<u32>)> = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| model_err(format!("tokenization failed: {e}")))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        ids.truncate(max_len);
        mask.truncate(max_len);
        rows.push((ids, mask));
    }
    let width = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);
    let mut flat_ids = Vec::with_capacity(rows.len() * width);
    let mut flat_mask = Vec::with_capacity(rows.len() * width);
    for (mut ids, mut mask) in rows {
        ids.resize(width, pad);
        mask.resize(width, 0);
        flat_ids.extend(ids);
        flat_mask.extend(mask);
    }
    let batch = texts.len();
    let input_ids = Tensor::from_vec(flat_ids, (batch, width), device).map_err(model_err)?;
    let attention_mask = Tensor::from_vec(flat_mask, (batch, width), device).map_err(model_err)?;
    Ok((input_ids, attention_mask))
}
