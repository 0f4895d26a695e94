use std::sync::{Arc, Mutex};

use pgrkam_core::traits::CompletionProvider;
use pgrkam_core::types::ChunkMeta;
use pgrkam_core::Error;
use pgrkam_embed::{FakeEmbedder, FAKE_DIM};
use pgrkam_rag::prompts::{GENERAL_SYSTEM_PROMPT, SYSTEM_PROMPT};
use pgrkam_rag::{general_answer, Answer, AnswerSynthesizer, Language, refusal_message};
use pgrkam_vector::VectorStore;

/// Records every prompt and answers with a fixed string.
#[derive(Default)]
struct ScriptedProvider {
    prompts: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl ScriptedProvider {
    fn failing() -> Self { Self { fail: true, ..Self::default() } }
    fn calls(&self) -> Vec<(String, String)> { self.prompts.lock().unwrap().clone() }
}

impl CompletionProvider for ScriptedProvider {
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> pgrkam_core::Result<String> {
        self.prompts.lock().unwrap().push((system_prompt.to_string(), user_prompt.to_string()));
        if self.fail {
            return Err(Error::provider("Groq", "API error 429: Rate limit reached"));
        }
        Ok("Apply on the portal (https://pgrkam.com/clerk)".to_string())
    }
}

fn store() -> Arc<VectorStore> { Arc::new(VectorStore::new(Arc::new(FakeEmbedder::new(FAKE_DIM)))) }

#[test]
fn empty_store_refuses_without_calling_provider() {
    let provider = Arc::new(ScriptedProvider::default());
    let synth = AnswerSynthesizer::new(store(), provider.clone());
    let answer = synth.answer("clerk jobs", Language::En).unwrap();
    assert!(answer.is_refusal());
    assert_eq!(answer.text(), refusal_message("https://www.pgrkam.com"));
    assert!(answer.text().contains("https://www.pgrkam.com"));
    assert!(provider.calls().is_empty());
}

#[test]
fn refusal_points_at_configured_portal() {
    let provider = Arc::new(ScriptedProvider::default());
    let synth = AnswerSynthesizer::new(store(), provider.clone()).with_portal_url("https://staging.pgrkam.example/");
    let answer = synth.answer("clerk jobs", Language::Hi).unwrap();
    assert!(answer.is_refusal());
    assert!(answer.text().contains("https://staging.pgrkam.example "), "{}", answer.text());
    assert!(!answer.text().contains("https://www.pgrkam.com"));
    assert!(provider.calls().is_empty());
}

#[test]
fn single_web_hit_cites_its_url_once() {
    let store = store();
    let text = "Clerk vacancies are open for graduates with typing skills in Punjab departments".repeat(3);
    store.build(vec![text.clone()], vec![ChunkMeta::web("https://pgrkam.com/clerk", 0)]).unwrap();
    let provider = Arc::new(ScriptedProvider::default());
    let synth = AnswerSynthesizer::new(store, provider.clone());

    let answer = synth.answer("clerk vacancies", Language::Hi).unwrap();
    let Answer::Grounded { text: reply, citations, hits } = answer else { panic!("expected grounded answer") };
    assert_eq!(reply, "Apply on the portal (https://pgrkam.com/clerk)");
    assert_eq!(citations, vec!["(https://pgrkam.com/clerk)"]);
    assert_eq!(hits.len(), 1);

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    let (system, user) = &calls[0];
    assert_eq!(system, SYSTEM_PROMPT);
    assert!(user.starts_with("User language: hi\nQuestion: clerk vacancies\n"));
    assert!(user.contains(&format!("[https://pgrkam.com/clerk] {text}")));
    assert_eq!(user.matches("(https://pgrkam.com/clerk)").count(), 1);
}

#[test]
fn document_hits_are_cited_by_page() {
    let store = store();
    store
        .build(
            vec!["Age limit for clerk posts is 18 to 37 years".into(), "Skill courses in welding".into()],
            vec![ChunkMeta::document("notice.pdf", Some(2), 0), ChunkMeta::document("skills.pdf", None, 0)],
        )
        .unwrap();
    let provider = Arc::new(ScriptedProvider::default());
    let synth = AnswerSynthesizer::new(store, provider.clone()).with_top_k(2);
    let Answer::Grounded { citations, .. } = synth.answer("age limit clerk", Language::En).unwrap() else { panic!("expected grounded answer") };
    assert!(citations.contains(&"(notice.pdf p.2)".to_string()));
    assert!(citations.contains(&"(skills.pdf p.?)".to_string()));
}

#[test]
fn provider_failure_propagates() {
    let store = store();
    store.build(vec!["Job mela in Mohali on Friday".into()], vec![ChunkMeta::web("https://pgrkam.com/mela", 0)]).unwrap();
    let synth = AnswerSynthesizer::new(store, Arc::new(ScriptedProvider::failing()));
    let err = synth.answer("job mela", Language::En).unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
    assert!(err.to_string().contains("Rate limit reached"));
}

#[test]
fn general_answer_uses_portal_assistant_prompt() {
    let provider = ScriptedProvider::default();
    general_answer(&provider, "how to register", Language::Pa).unwrap();
    let calls = provider.calls();
    assert_eq!(calls[0].0, GENERAL_SYSTEM_PROMPT);
    assert_eq!(calls[0].1, "User language: pa\nUser query: how to register\nAnswer briefly with steps if relevant.");
}
