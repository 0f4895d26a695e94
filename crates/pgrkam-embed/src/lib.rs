//! pgrkam-embed
//!
//! Sentence embeddings for chunks, queries, job rows and preference strings.
//! The local model is a multilingual BERT-family encoder (English, Hindi and
//! Punjabi) run with candle; output is mean-pooled and L2-normalized.

use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use twox_hash::XxHash64;

use pgrkam_core::traits::Embedder;
use pgrkam_core::{Error, Result};

pub mod device;
pub mod pool;
pub mod tokenize;

pub use pool::masked_mean_l2;

/// Dimensionality of the deterministic test embedder (matches MiniLM-L12).
pub const FAKE_DIM: usize = 384;

const MODEL_BATCH: usize = 32;

pub(crate) fn model_err<E: Display>(e: E) -> Error { Error::provider("local-embedder", e.to_string()) }

pub struct EmbeddingModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl EmbeddingModel {
    /// Load tokenizer, config and weights from `model_dir`.
    ///
    /// Weights are read from `model.safetensors`, or `pytorch_model.bin` when
    /// only a pickle checkpoint is present.
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = device::select_device();
        tracing::info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| model_err(format!("failed to load tokenizer from {}: {e}", tokenizer_path.display())))?;
        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| model_err(format!("{} has no hidden_size", config_path.display())))? as usize;

        let safetensors = model_dir.join("model.safetensors");
        let vb = if safetensors.exists() {
            // SAFETY: the weights file is memory-mapped read-only and must not be modified while loaded.
            unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, &device) }.map_err(model_err)?
        } else {
            let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin")).map_err(model_err)?;
            let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
            VarBuilder::from_tensors(weights_map, DType::F32, &device)
        };
        let model = BertModel::load(vb, &config).map_err(model_err)?;
        tracing::info!(dim, max_len, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) = tokenize::tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like().map_err(model_err)?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask)).map_err(model_err)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        pooled.to_device(&Device::Cpu).and_then(|t| t.to_vec2::<f32>()).map_err(model_err)
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MODEL_BATCH) {
            out.extend(self.embed_chunk(chunk)?);
        }
        tracing::debug!(count = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(out)
    }
}

/// Deterministic bag-of-tokens embedder for tests and offline development.
///
/// Each lowercased whitespace token is hashed into one of `dim` buckets.
/// Identical texts always map to identical unit vectors.
#[derive(Debug, Clone)]
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i % 3) as f32 * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

static SHARED_MODEL: OnceLock<Arc<EmbeddingModel>> = OnceLock::new();

/// Process-wide model, loaded on first use and reused afterwards.
///
/// The first successful load wins; later calls ignore their arguments.
pub fn shared_model(model_dir: &Path, max_len: usize) -> Result<Arc<EmbeddingModel>> {
    if let Some(model) = SHARED_MODEL.get() { return Ok(Arc::clone(model)); }
    let loaded = Arc::new(EmbeddingModel::load(&resolve_model_dir(model_dir)?, max_len)?);
    Ok(Arc::clone(SHARED_MODEL.get_or_init(|| loaded)))
}

pub fn fake_embeddings_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// `FakeEmbedder` when `APP_USE_FAKE_EMBEDDINGS` is set, else the shared model.
pub fn get_default_embedder(model_dir: &Path, max_len: usize) -> Result<Arc<dyn Embedder>> {
    if fake_embeddings_requested() {
        tracing::info!("using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(FAKE_DIM)));
    }
    let model: Arc<dyn Embedder> = shared_model(model_dir, max_len)?;
    Ok(model)
}

/// `APP_MODEL_DIR` overrides the configured directory.
fn resolve_model_dir(configured: &Path) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() { tracing::info!("using APP_MODEL_DIR: {}", p.display()); return Ok(p); }
        tracing::warn!("APP_MODEL_DIR={} does not exist", dir);
    }
    if configured.exists() { return Ok(configured.to_path_buf()); }
    Err(Error::NotFound(format!("embedding model directory {}", configured.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_embedder_is_case_insensitive() {
        let e = FakeEmbedder::new(64);
        assert_eq!(e.embed_one("Clerk Jobs"), e.embed_one("clerk jobs"));
    }

    #[test]
    fn missing_model_dir_is_not_found() {
        let err = resolve_model_dir(Path::new("/definitely/not/a/model/dir")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
