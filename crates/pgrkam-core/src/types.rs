//! Domain types shared by the retrieval, grounding and ranking crates.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where a chunk came from.
///
/// Web pages are cited by URL, uploaded documents by file name and page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkSource {
    Web { url: String },
    Document { name: String, page: Option<u32> },
}

impl ChunkSource {
    /// Classify a raw source string: anything starting with `http` is a URL.
    pub fn from_raw(source: &str, page: Option<u32>) -> Self {
        if source.starts_with("http") {
            Self::Web { url: source.to_string() }
        } else {
            Self::Document { name: source.to_string(), page }
        }
    }

    /// Citation label without brackets: `url` or `name p.page`.
    pub fn label(&self) -> String {
        match self {
            Self::Web { url } => url.clone(),
            Self::Document { name, page: Some(page) } => format!("{name} p.{page}"),
            Self::Document { name, page: None } => format!("{name} p.?"),
        }
    }
}

/// Provenance of a chunk.
///
/// - `source`: URL or document (with page)
/// - `index`: position of the chunk within its source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub source: ChunkSource,
    pub index: usize,
}

impl ChunkMeta {
    pub fn web(url: impl Into<String>, index: usize) -> Self {
        Self { source: ChunkSource::Web { url: url.into() }, index }
    }

    pub fn document(name: impl Into<String>, page: Option<u32>, index: usize) -> Self {
        Self { source: ChunkSource::Document { name: name.into(), page }, index }
    }
}

/// The atomic retrieval unit: a bounded substring of a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub meta: ChunkMeta,
}

/// One retrieval result. `score` is cosine similarity, higher is better.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub meta: ChunkMeta,
    pub score: f32,
}

/// A unit-norm dense vector.
///
/// Construction enforces normalization so that a dot product between two
/// embeddings is their cosine similarity. The all-zero vector is kept as-is
/// and scores 0 against everything.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Tolerance within which a provider vector is accepted as unit norm.
    pub const NORM_TOLERANCE: f32 = 1e-3;

    pub fn new(mut values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::MalformedInput("embedding has no components".into()));
        }
        if values.iter().any(|x| !x.is_finite()) {
            return Err(Error::MalformedInput("embedding has non-finite components".into()));
        }
        let norm = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 && (norm - 1.0).abs() > Self::NORM_TOLERANCE {
            tracing::warn!(norm, "renormalizing embedding");
            for x in &mut values {
                *x /= norm;
            }
        }
        Ok(Self(values))
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Inner product, which equals cosine similarity for unit vectors.
    pub fn dot(&self, other: &Self) -> f32 {
        dot(&self.0, &other.0)
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// A row of the external job catalog. Missing columns are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRow {
    pub id: String,
    pub title: String,
    pub location: String,
    pub sector: String,
    pub description: String,
    pub url: String,
    pub deadline: String,
}

/// A job row with its similarity to the user's preferences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredJob {
    pub job: JobRow,
    pub score: f32,
}

/// What the user is looking for.
///
/// List fields keep first-seen order and hold no duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    pub roles: Vec<String>,
    pub sectors: Vec<String>,
    pub locations: Vec<String>,
    pub degree: String,
    pub experience: String,
}

impl Default for PreferenceProfile {
    fn default() -> Self {
        Self {
            roles: vec!["clerk".into(), "web developer".into()],
            sectors: vec!["government".into(), "private".into()],
            locations: vec!["Chandigarh".into(), "Ludhiana".into(), "Mohali".into()],
            degree: "B.Com".into(),
            experience: "0".into(),
        }
    }
}

impl PreferenceProfile {
    /// Build a profile from the comma-separated form inputs.
    pub fn parse(roles: &str, sectors: &str, locations: &str, degree: &str, experience: &str) -> Self {
        Self {
            roles: split_list(roles),
            sectors: split_list(sectors),
            locations: split_list(locations),
            degree: degree.trim().to_string(),
            experience: experience.trim().to_string(),
        }
    }

    /// A profile may only be saved when no field is empty.
    pub fn validate(&self) -> Result<()> {
        let empty: Vec<&str> = [
            ("roles", self.roles.is_empty()),
            ("sectors", self.sectors.is_empty()),
            ("locations", self.locations.is_empty()),
            ("degree", self.degree.is_empty()),
            ("experience", self.experience.is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, is_empty)| is_empty.then_some(name))
        .collect();
        if empty.is_empty() {
            Ok(())
        } else {
            Err(Error::MalformedInput(format!("preference fields must not be empty: {}", empty.join(", "))))
        }
    }
}

fn split_list(input: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !out.iter().any(|seen| seen == item) {
            out.push(item.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_classification() {
        assert_eq!(ChunkSource::from_raw("https://pgrkam.com/a", Some(2)), ChunkSource::Web { url: "https://pgrkam.com/a".into() });
        assert_eq!(ChunkSource::from_raw("notice.pdf", Some(2)).label(), "notice.pdf p.2");
        assert_eq!(ChunkSource::from_raw("notice.pdf", None).label(), "notice.pdf p.?");
    }

    #[test]
    fn embedding_is_normalized_on_construction() {
        let e = Embedding::new(vec![3.0, 4.0]).unwrap();
        assert!((e.as_slice()[0] - 0.6).abs() < 1e-6);
        assert!((e.dot(&e) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn embedding_rejects_nan_and_keeps_zero() {
        assert!(Embedding::new(vec![f32::NAN, 1.0]).is_err());
        assert!(Embedding::new(vec![]).is_err());
        let z = Embedding::new(vec![0.0; 4]).unwrap();
        assert_eq!(z.dot(&z), 0.0);
    }

    #[test]
    fn preferences_parse_and_validate() {
        let p = PreferenceProfile::parse(" clerk, ,clerk, typist ", "government", "Mohali", "B.A", "");
        assert_eq!(p.roles, vec!["clerk", "typist"]);
        let err = p.validate().unwrap_err().to_string();
        assert!(err.contains("experience"), "{err}");
        assert!(PreferenceProfile::default().validate().is_ok());
    }
}
