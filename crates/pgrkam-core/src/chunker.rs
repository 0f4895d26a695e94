//! Overlapping fixed-size character windows with provenance.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkMeta, ChunkSource};

/// Fragments shorter than this carry no retrievable signal.
pub const MIN_CHUNK_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap: usize,
    pub min_chars: usize,
}

impl ChunkingConfig {
    /// Window for uploaded documents (paged).
    pub const fn document() -> Self {
        Self { max_chars: 900, overlap: 150, min_chars: MIN_CHUNK_CHARS }
    }

    /// Window for crawled web pages.
    pub const fn web() -> Self {
        Self { max_chars: 1200, overlap: 200, min_chars: MIN_CHUNK_CHARS }
    }

    pub fn validate(&self) -> Result<()> {
        if self.overlap == 0 || self.overlap >= self.max_chars {
            return Err(Error::MalformedInput(format!(
                "chunk overlap must satisfy 0 < overlap < max_chars (overlap={}, max_chars={})",
                self.overlap, self.max_chars
            )));
        }
        if self.min_chars > self.max_chars {
            return Err(Error::MalformedInput(format!(
                "chunk min_chars must not exceed max_chars (min_chars={}, max_chars={})",
                self.min_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self { Self::document() }
}

/// Split `text` into windows of at most `max_chars` characters.
///
/// Window starts advance by `max_chars - overlap`; scanning stops at the
/// first window that reaches the end of the text. Windows shorter than
/// `min_chars` are dropped. Offsets are counted in characters so multi-byte
/// scripts are never cut mid code point.
pub fn split_windows(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    config.validate()?;
    // Byte offset of every char plus the end of the string.
    let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let total = bounds.len() - 1;
    let step = config.max_chars - config.overlap;

    let mut windows = Vec::new();
    let mut start = 0usize;
    while start < total {
        let end = (start + config.max_chars).min(total);
        if end - start >= config.min_chars {
            windows.push(text[bounds[start]..bounds[end]].to_string());
        }
        if end >= total { break; }
        start += step;
    }
    Ok(windows)
}

/// Chunk one unpaginated source (a crawled page, a plain text file).
pub fn chunk(text: &str, source: &ChunkSource, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    Ok(split_windows(text, config)?
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk { text, meta: ChunkMeta { source: source.clone(), index } })
        .collect())
}

/// Chunk a paginated document, restarting the window on every page so each
/// chunk maps to exactly one 1-based page. Blank pages are skipped.
pub fn chunk_pages<S: AsRef<str>>(name: &str, pages: &[S], config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    config.validate()?;
    let mut chunks = Vec::new();
    for (page_index, page) in pages.iter().enumerate() {
        let page_text = page.as_ref().trim();
        if page_text.is_empty() { continue; }
        let page_no = u32::try_from(page_index + 1).map_err(|_| Error::MalformedInput(format!("{name}: too many pages")))?;
        for text in split_windows(page_text, config)? {
            let index = chunks.len();
            chunks.push(Chunk { text, meta: ChunkMeta::document(name, Some(page_no), index) });
        }
    }
    Ok(chunks)
}

/// Split chunks into the parallel `(texts, metas)` sequences `build` expects.
pub fn unzip(chunks: Vec<Chunk>) -> (Vec<String>, Vec<ChunkMeta>) {
    chunks.into_iter().map(|c| (c.text, c.meta)).unzip()
}
