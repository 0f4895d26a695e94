//! OpenAI-compatible chat completions over blocking HTTP.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use pgrkam_core::config::LlmSettings;
use pgrkam_core::traits::CompletionProvider;
use pgrkam_core::{Error, Result};

const PROVIDER_NAME: &str = "Groq";

pub struct ChatCompletionsProvider {
    name: String,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: Client,
}

impl ChatCompletionsProvider {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>, temperature: f32, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::InvalidConfig("completion API key is empty".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("failed to build HTTP client: {e}")))?;
        Ok(Self { name: PROVIDER_NAME.to_string(), api_url: api_url.into(), api_key, model: model.into(), temperature, client })
    }

    /// Reads the key from the environment variable named in `settings.api_key_env`.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env)
            .map_err(|_| Error::InvalidConfig(format!("Missing {} in environment", settings.api_key_env)))?;
        Self::new(&settings.api_url, api_key, &settings.model, settings.temperature, Duration::from_secs(settings.timeout_secs))
    }

    pub fn model(&self) -> &str { &self.model }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&auth).map_err(|_| Error::InvalidConfig("API key is not a valid header value".into()))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl CompletionProvider for ChatCompletionsProvider {
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage { role: "system", content: system_prompt }, ChatMessage { role: "user", content: user_prompt }],
        };
        tracing::debug!(model = %self.model, prompt_chars = user_prompt.len(), "chat completion request");
        let resp = self
            .client
            .post(&self.api_url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .map_err(|e| Error::provider(&self.name, format!("request failed: {e}")))?;
        let status = resp.status();
        if status.as_u16() >= 400 {
            let text = resp.text().unwrap_or_else(|_| "<body unavailable>".to_string());
            tracing::warn!(status = status.as_u16(), "completion provider returned an error");
            return Err(status_error(&self.name, status.as_u16(), &text));
        }
        let parsed: ChatResponse = resp.json().map_err(|e| Error::provider(&self.name, format!("failed to parse response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::provider(&self.name, "response has no choices"))
    }
}

fn status_error(provider: &str, status: u16, body: &str) -> Error {
    Error::provider(provider, format!("API error {status}: {}", upstream_message(body)))
}

/// `error.message` from a JSON error body, else the raw body.
pub fn upstream_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_prefers_error_message() {
        assert_eq!(upstream_message(r#"{"error":{"message":"Rate limit reached","type":"tokens"}}"#), "Rate limit reached");
        assert_eq!(upstream_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(upstream_message(r#"{"detail":"x"}"#), r#"{"detail":"x"}"#);
    }

    #[test]
    fn status_error_names_provider_once() {
        let err = status_error(PROVIDER_NAME, 429, r#"{"error":{"message":"Rate limit reached"}}"#);
        assert_eq!(err.to_string(), "Groq provider failed: API error 429: Rate limit reached");
    }

    #[test]
    fn empty_key_is_invalid_config() {
        let err = ChatCompletionsProvider::new("https://api.example/v1/chat/completions", " ", "m", 0.2, Duration::from_secs(1)).err();
        assert!(matches!(err, Some(Error::InvalidConfig(_))));
    }

    #[test]
    fn missing_key_env_is_invalid_config() {
        let settings = LlmSettings {
            api_url: "https://api.example/v1/chat/completions".into(),
            model: "m".into(),
            temperature: 0.2,
            timeout_secs: 5,
            api_key_env: "PGRKAM_TEST_KEY_THAT_IS_NEVER_SET".into(),
        };
        let err = ChatCompletionsProvider::from_settings(&settings).err();
        assert!(matches!(err, Some(Error::InvalidConfig(ref m)) if m.contains("PGRKAM_TEST_KEY_THAT_IS_NEVER_SET")));
    }

    #[test]
    fn unreachable_endpoint_is_provider_error() {
        let provider = ChatCompletionsProvider::new("http://127.0.0.1:9/v1/chat/completions", "key", "m", 0.2, Duration::from_millis(500)).unwrap();
        let err = provider.complete("sys", "user").unwrap_err();
        assert!(matches!(err, Error::Provider { ref provider, .. } if provider == "Groq"), "{err}");
    }
}
