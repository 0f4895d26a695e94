use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};

use pgrkam_core::chunker;
use pgrkam_core::traits::Embedder;
use pgrkam_core::types::{Chunk, ChunkMeta, Embedding, SearchHit};
use pgrkam_core::{Error, Result};

use crate::cache::{hash_content, EmbeddingCache};
use crate::flat_index::FlatIndex;

pub const DEFAULT_EMBED_BATCH: usize = 64;

/// Summary of the most recent successful build.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats {
    pub chunks: usize,
    pub dim: usize,
    /// Input token limit of the embedder; longer chunks are truncated.
    pub max_tokens: usize,
    pub built_at: DateTime<Utc>,
    /// Chunks whose embedding came from the content-hash cache.
    pub cache_hits: usize,
    /// Distinct texts sent to the embedder.
    pub embedded: usize,
}

#[derive(Debug, Default)]
struct Snapshot {
    texts: Vec<String>,
    metas: Vec<ChunkMeta>,
    index: FlatIndex,
    stats: Option<IndexStats>,
}

/// Chunk texts, their metadata and a flat index, replaced wholesale by `build`.
///
/// Readers clone the current `Arc<Snapshot>` and never see a half-built
/// index. Builds are serialized on the cache lock.
pub struct VectorStore {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    snapshot: RwLock<Arc<Snapshot>>,
    cache: Mutex<EmbeddingCache>,
}

impl VectorStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            batch_size: DEFAULT_EMBED_BATCH,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            cache: Mutex::new(EmbeddingCache::new()),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> { &self.embedder }

    pub fn len(&self) -> usize { self.current().texts.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn stats(&self) -> Option<IndexStats> { self.current().stats.clone() }

    pub fn build_chunks(&self, chunks: Vec<Chunk>) -> Result<IndexStats> {
        let (texts, metas) = chunker::unzip(chunks);
        self.build(texts, metas)
    }

    /// Embed every chunk and replace the current index.
    ///
    /// On error the previous index stays in place.
    pub fn build(&self, texts: Vec<String>, metas: Vec<ChunkMeta>) -> Result<IndexStats> {
        if texts.len() != metas.len() {
            return Err(Error::MalformedInput(format!("{} chunks but {} metadata entries", texts.len(), metas.len())));
        }
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let hashes: Vec<String> = texts.iter().map(|t| hash_content(t)).collect();
        let cache_hits = hashes.iter().filter(|h| cache.contains(h)).count();

        // First occurrence of every uncached text.
        let mut seen = HashSet::new();
        let pending: Vec<usize> = (0..hashes.len()).filter(|&i| !cache.contains(&hashes[i]) && seen.insert(hashes[i].as_str())).collect();
        self.embed_pending(&texts, &hashes, &pending, &mut cache)?;

        let dim = self.embedder.dim();
        let mut index = FlatIndex::with_capacity(dim, texts.len());
        for hash in &hashes {
            let embedding = cache.get(hash).ok_or_else(|| Error::Operation(format!("no embedding for chunk {hash}")))?;
            index.add(embedding)?;
        }
        let live: HashSet<&str> = hashes.iter().map(String::as_str).collect();
        let pruned = cache.retain_live(&live);

        let max_tokens = self.embedder.max_len();
        let stats = IndexStats { chunks: texts.len(), dim, max_tokens, built_at: Utc::now(), cache_hits, embedded: pending.len() };
        let next = Arc::new(Snapshot { texts, metas, index, stats: Some(stats.clone()) });
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = next;
        tracing::info!(chunks = stats.chunks, dim, max_tokens, cache_hits, embedded = stats.embedded, pruned, "vector index built");
        Ok(stats)
    }

    /// Top `k` chunks for `query`, best first.
    ///
    /// An unbuilt or empty store returns no hits without calling the embedder.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let snapshot = self.current();
        if k == 0 || snapshot.index.is_empty() {
            tracing::debug!(k, chunks = snapshot.texts.len(), "search skipped");
            return Ok(vec![]);
        }
        let vector = self
            .embedder
            .embed_batch(&[query.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::provider("embedder", "no vector returned for query"))?;
        let query_embedding = Embedding::new(vector)?;
        let hits = snapshot
            .index
            .search(&query_embedding, k)?
            .into_iter()
            .map(|(row, score)| SearchHit { text: snapshot.texts[row].clone(), meta: snapshot.metas[row].clone(), score })
            .collect::<Vec<_>>();
        tracing::debug!(k, returned = hits.len(), top = hits.first().map(|h| h.score), "search");
        Ok(hits)
    }

    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn embed_pending(&self, texts: &[String], hashes: &[String], pending: &[usize], cache: &mut EmbeddingCache) -> Result<()> {
        if pending.is_empty() { return Ok(()); }
        let dim = self.embedder.dim();
        let pb = progress_bar(pending.len(), self.batch_size);
        for batch in pending.chunks(self.batch_size) {
            let inputs: Vec<String> = batch.iter().map(|&i| texts[i].clone()).collect();
            let vectors = self.embedder.embed_batch(&inputs)?;
            if vectors.len() != inputs.len() {
                return Err(Error::provider("embedder", format!("returned {} vectors for {} texts", vectors.len(), inputs.len())));
            }
            for (&i, vector) in batch.iter().zip(vectors) {
                let embedding = Embedding::new(vector)?;
                if embedding.dim() != dim {
                    return Err(Error::MalformedInput(format!("embedder returned dimension {} (expected {dim})", embedding.dim())));
                }
                cache.insert(hashes[i].clone(), embedding);
            }
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        Ok(())
    }
}

fn progress_bar(len: usize, batch_size: usize) -> ProgressBar {
    // A single batch finishes too fast to be worth drawing.
    if len <= batch_size { return ProgressBar::hidden(); }
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
