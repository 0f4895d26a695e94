use pgrkam_core::types::{ChunkSource, SearchHit};

/// Hits considered for the citation list.
pub const CITATION_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    /// One `[label] text` line per hit, separated by blank lines.
    pub block: String,
    /// `(label)` markers, deduplicated in first-seen order.
    pub citations: Vec<String>,
}

impl AssembledContext {
    /// Citation markers joined for the prompt.
    pub fn citation_markers(&self) -> String { self.citations.join(" ") }
}

pub fn context_line(hit: &SearchHit) -> String {
    format!("[{}] {}", hit.meta.source.label(), hit.text)
}

pub fn citation(source: &ChunkSource) -> String {
    format!("({})", source.label())
}

pub fn assemble(hits: &[SearchHit]) -> AssembledContext {
    assemble_with_limit(hits, CITATION_LIMIT)
}

pub fn assemble_with_limit(hits: &[SearchHit], citation_limit: usize) -> AssembledContext {
    let block = hits.iter().map(context_line).collect::<Vec<_>>().join("\n\n");
    let mut citations: Vec<String> = Vec::new();
    for hit in hits.iter().take(citation_limit) {
        let c = citation(&hit.meta.source);
        if !citations.contains(&c) { citations.push(c); }
    }
    AssembledContext { block, citations }
}
