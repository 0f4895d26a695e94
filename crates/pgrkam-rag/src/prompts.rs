//! Prompt text sent to the completion provider.

use crate::language::Language;

pub const SYSTEM_PROMPT: &str = "You are PGRKAM AI Assistant. RULES:
- Answer ONLY with verified PGRKAM context.
- Answer ONLY using the provided context. If the context is insufficient, say you cannot find it and suggest the closest PGRKAM link.
- If no retrieved context is provided, refuse and direct to https://www.pgrkam.com.";

pub const GENERAL_SYSTEM_PROMPT: &str = "You are a helpful assistant for the PGRKAM portal.";

pub fn grounded_user_prompt(lang: Language, query: &str, context: &str, citations: &str) -> String {
    format!(
        "User language: {lang}\nQuestion: {query}\n\nContext (must use):\n{context}\n\nInstructions:\n- Use ONLY the context above.\n- Include citations like {citations}."
    )
}

pub fn general_user_prompt(lang: Language, query: &str) -> String {
    format!("User language: {lang}\nUser query: {query}\nAnswer briefly with steps if relevant.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounded_prompt_layout() {
        let p = grounded_user_prompt(Language::Hi, "clerk?", "[https://x] y", "(https://x)");
        assert!(p.starts_with("User language: hi\nQuestion: clerk?\n\nContext (must use):\n[https://x] y\n\n"));
        assert!(p.ends_with("- Include citations like (https://x)."));
    }
}
