use std::collections::{HashMap, HashSet};

use pgrkam_core::types::Embedding;

pub fn hash_content(s: &str) -> String {
    blake3::hash(s.as_bytes()).to_hex().to_string()
}

/// Content-hash keyed embeddings from previous builds.
///
/// Entries are only valid for one embedder; a dimension change clears them.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    dim: Option<usize>,
    entries: HashMap<String, Embedding>,
}

impl EmbeddingCache {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, hash: &str) -> Option<&Embedding> { self.entries.get(hash) }

    pub fn contains(&self, hash: &str) -> bool { self.entries.contains_key(hash) }

    pub fn insert(&mut self, hash: String, embedding: Embedding) {
        if self.dim.is_some_and(|d| d != embedding.dim()) {
            tracing::warn!(old = ?self.dim, new = embedding.dim(), "embedding dimension changed, clearing cache");
            self.entries.clear();
        }
        self.dim = Some(embedding.dim());
        self.entries.insert(hash, embedding);
    }

    /// Drop every entry whose hash is not in `live`. Returns the number removed.
    pub fn retain_live(&mut self, live: &HashSet<&str>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|h, _| live.contains(h.as_str()));
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_hex() {
        let h = hash_content("clerk");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_content("clerk"));
        assert_ne!(h, hash_content("Clerk"));
    }

    #[test]
    fn prune_and_dimension_reset() {
        let mut cache = EmbeddingCache::new();
        cache.insert("a".into(), Embedding::new(vec![1.0, 0.0]).unwrap());
        cache.insert("b".into(), Embedding::new(vec![0.0, 1.0]).unwrap());
        let live: HashSet<&str> = ["b"].into_iter().collect();
        assert_eq!(cache.retain_live(&live), 1);
        assert!(cache.contains("b") && !cache.contains("a"));

        cache.insert("c".into(), Embedding::new(vec![1.0, 0.0, 0.0]).unwrap());
        assert_eq!(cache.len(), 1);
    }
}
