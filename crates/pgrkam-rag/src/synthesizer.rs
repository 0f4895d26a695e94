use std::sync::Arc;

use pgrkam_core::config::DEFAULT_PORTAL_URL;
use pgrkam_core::traits::CompletionProvider;
use pgrkam_core::types::SearchHit;
use pgrkam_core::Result;
use pgrkam_vector::VectorStore;

use crate::context::{assemble_with_limit, CITATION_LIMIT};
use crate::language::Language;
use crate::prompts;

/// Returned when retrieval finds nothing, pointing the user at `portal_url`.
/// The provider is not consulted.
pub fn refusal_message(portal_url: &str) -> String {
    format!(
        "माफ़ कीजिए, इस विषय की जानकारी अभी संदर्भ में नहीं मिली। कृपया PGRKAM की PDF/पेज जोड़कर इंडेक्स दोबारा बनाएँ, या {} देखें।",
        portal_url.trim_end_matches('/')
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Nothing was retrieved.
    Refused(String),
    /// Provider output for a context-backed prompt, verbatim.
    Grounded { text: String, citations: Vec<String>, hits: Vec<SearchHit> },
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Self::Refused(text) | Self::Grounded { text, .. } => text,
        }
    }

    pub fn is_refusal(&self) -> bool { matches!(self, Self::Refused(_)) }
}

pub struct AnswerSynthesizer {
    store: Arc<VectorStore>,
    provider: Arc<dyn CompletionProvider>,
    top_k: usize,
    citation_limit: usize,
    portal_url: String,
}

impl AnswerSynthesizer {
    pub fn new(store: Arc<VectorStore>, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { store, provider, top_k: 5, citation_limit: CITATION_LIMIT, portal_url: DEFAULT_PORTAL_URL.to_string() }
    }

    pub fn with_portal_url(mut self, portal_url: impl Into<String>) -> Self {
        self.portal_url = portal_url.into();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_citation_limit(mut self, citation_limit: usize) -> Self {
        self.citation_limit = citation_limit;
        self
    }

    pub fn store(&self) -> &Arc<VectorStore> { &self.store }

    pub fn answer(&self, query: &str, lang: Language) -> Result<Answer> {
        let hits = self.store.search(query, self.top_k)?;
        if hits.is_empty() {
            tracing::info!("no context retrieved, refusing");
            return Ok(Answer::Refused(refusal_message(&self.portal_url)));
        }
        let context = assemble_with_limit(&hits, self.citation_limit);
        let user_prompt = prompts::grounded_user_prompt(lang, query, &context.block, &context.citation_markers());
        tracing::debug!(hits = hits.len(), citations = context.citations.len(), %lang, "grounded prompt built");
        let text = self.provider.complete(prompts::SYSTEM_PROMPT, &user_prompt)?;
        Ok(Answer::Grounded { text, citations: context.citations, hits })
    }
}

/// Ungrounded answer, used when the knowledge base is off or missing.
pub fn general_answer(provider: &dyn CompletionProvider, query: &str, lang: Language) -> Result<String> {
    provider.complete(prompts::GENERAL_SYSTEM_PROMPT, &prompts::general_user_prompt(lang, query))
}
