use pgrkam_core::types::{dot, Embedding};
use pgrkam_core::{Error, Result};

/// Exhaustive inner-product index over contiguous row-major vectors.
///
/// With unit-norm inputs the inner product is cosine similarity.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self { Self { dim, data: Vec::new() } }

    pub fn with_capacity(dim: usize, rows: usize) -> Self { Self { dim, data: Vec::with_capacity(dim * rows) } }

    pub fn dim(&self) -> usize { self.dim }

    pub fn len(&self) -> usize { if self.dim == 0 { 0 } else { self.data.len() / self.dim } }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    pub fn add(&mut self, embedding: &Embedding) -> Result<()> {
        if embedding.dim() != self.dim {
            return Err(Error::MalformedInput(format!("embedding dimension {} != index dimension {}", embedding.dim(), self.dim)));
        }
        self.data.extend_from_slice(embedding.as_slice());
        Ok(())
    }

    /// Top `k` rows as `(row, score)`, best first.
    ///
    /// Scores are clamped to `[-1, 1]`; equal scores keep insertion order.
    pub fn search(&self, query: &Embedding, k: usize) -> Result<Vec<(usize, f32)>> {
        if k == 0 || self.is_empty() { return Ok(vec![]); }
        if query.dim() != self.dim {
            return Err(Error::MalformedInput(format!("query dimension {} != index dimension {}", query.dim(), self.dim)));
        }
        let q = query.as_slice();
        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(i, row)| (i, dot(q, row).clamp(-1.0, 1.0)))
            .collect();
        // Stable sort: ties stay in row order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(v: &[f32]) -> Embedding { Embedding::new(v.to_vec()).unwrap() }

    #[test]
    fn ranks_by_inner_product() {
        let mut index = FlatIndex::new(2);
        index.add(&emb(&[1.0, 0.0])).unwrap();
        index.add(&emb(&[0.0, 1.0])).unwrap();
        index.add(&emb(&[1.0, 1.0])).unwrap();
        let hits = index.search(&emb(&[1.0, 0.1]), 2).unwrap();
        assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![0, 2]);
        assert!(hits[0].1 <= 1.0);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut index = FlatIndex::new(2);
        for _ in 0..4 { index.add(&emb(&[0.0, 1.0])).unwrap(); }
        let hits = index.search(&emb(&[0.0, 1.0]), 3).unwrap();
        assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut index = FlatIndex::new(3);
        assert!(matches!(index.add(&emb(&[1.0, 0.0])), Err(Error::MalformedInput(_))));
        index.add(&emb(&[1.0, 0.0, 0.0])).unwrap();
        assert!(index.search(&emb(&[1.0]), 1).is_err());
        assert_eq!(index.len(), 1);
    }
}
