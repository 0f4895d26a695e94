use crate::error::Result;

/// Maps text to dense vectors.
///
/// Implementations should return unit-norm vectors of length `dim()`; callers
/// wrap them in [`crate::types::Embedding`], which renormalizes anyway.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// A chat-style language model: `(system prompt, user prompt) -> answer`.
pub trait CompletionProvider: Send + Sync {
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Speech-to-text collaborator.
///
/// `Ok(None)` means the audio carried no speech; provider failures are `Err`
/// so callers can decide whether to surface, log or retry them.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, audio: &[u8], language_hint: Option<&str>) -> Result<Option<String>>;
}
