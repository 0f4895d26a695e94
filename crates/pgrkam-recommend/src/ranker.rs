use std::sync::Arc;

use pgrkam_core::traits::Embedder;
use pgrkam_core::types::{Embedding, JobRow, PreferenceProfile, ScoredJob};
use pgrkam_core::{Error, Result};

/// `title | sector | location | description`
pub fn job_blob(job: &JobRow) -> String {
    format!("{} | {} | {} | {}", job.title, job.sector, job.location, job.description)
}

/// `role:a,b sector:.. location:.. degree:.. exp:..`
pub fn preference_blob(prefs: &PreferenceProfile) -> String {
    format!(
        "role:{} sector:{} location:{} degree:{} exp:{}",
        prefs.roles.join(","),
        prefs.sectors.join(","),
        prefs.locations.join(","),
        prefs.degree,
        prefs.experience
    )
}

pub struct Recommender {
    embedder: Arc<dyn Embedder>,
}

impl Recommender {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self { Self { embedder } }

    /// Best `top_k` rows by similarity to `prefs`, highest first.
    ///
    /// Equal scores keep catalog order.
    pub fn recommend(&self, catalog: &[JobRow], prefs: &PreferenceProfile, top_k: usize) -> Result<Vec<ScoredJob>> {
        if catalog.is_empty() || top_k == 0 { return Ok(vec![]); }

        let blobs: Vec<String> = catalog.iter().map(job_blob).collect();
        let rows = self.embed(&blobs)?;
        let query = self.embed(&[preference_blob(prefs)])?.into_iter().next().ok_or_else(|| Error::provider("embedder", "no vector for preferences"))?;

        let mut scored: Vec<(usize, f32)> = rows.iter().map(|row| row.dot(&query)).enumerate().collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);
        tracing::debug!(catalog = catalog.len(), returned = scored.len(), "ranked jobs");
        Ok(scored.into_iter().map(|(i, score)| ScoredJob { job: catalog[i].clone(), score }).collect())
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let vectors = self.embedder.embed_batch(texts)?;
        if vectors.len() != texts.len() {
            return Err(Error::provider("embedder", format!("returned {} vectors for {} texts", vectors.len(), texts.len())));
        }
        let dim = self.embedder.dim();
        vectors
            .into_iter()
            .map(|v| {
                let e = Embedding::new(v)?;
                if e.dim() == dim { Ok(e) } else { Err(Error::MalformedInput(format!("embedder returned dimension {} (expected {dim})", e.dim()))) }
            })
            .collect()
    }
}
