//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_LLM__MODEL`).
//! Provides a helper to expand `~` and `${VAR}` in path values.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

pub const DEFAULT_PORTAL_URL: &str = "https://www.pgrkam.com";

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, env_name };
        config.validate_for_env(&config.env_name)?;
        Ok(config)
    }

    pub fn env_name(&self) -> &str { &self.env_name }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// The typed view over every section, validated.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(format!("Failed to extract settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> Result<()> {
        let settings = self.settings()?;
        match env {
            "prod" | "production" => {
                if !settings.llm.api_url.starts_with("https://") {
                    return Err(Error::InvalidConfig(format!("llm.api_url must use https in {env}: {}", settings.llm.api_url)));
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingSettings {
    pub document: ChunkingConfig,
    pub web: ChunkingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub citation_limit: usize,
    pub embed_batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Name of the environment variable that holds the API key.
    pub api_key_env: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub model_dir: String,
    pub max_len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendSettings {
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalSettings {
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub recommend: RecommendSettings,
    pub portal: PortalSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chunking: ChunkingSettings { document: ChunkingConfig::document(), web: ChunkingConfig::web() },
            retrieval: RetrievalSettings { top_k: 5, citation_limit: 3, embed_batch_size: 64 },
            llm: LlmSettings {
                api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
                model: "llama-3.3-70b-versatile".to_string(),
                temperature: 0.2,
                timeout_secs: 60,
                api_key_env: "GROQ_API_KEY".to_string(),
            },
            embedding: EmbeddingSettings { model_dir: "models/paraphrase-multilingual-MiniLM-L12-v2".to_string(), max_len: 128 },
            recommend: RecommendSettings { top_k: 5 },
            portal: PortalSettings { base_url: DEFAULT_PORTAL_URL.to_string() },
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.document.validate().map_err(|e| Error::InvalidConfig(format!("chunking.document: {e}")))?;
        self.chunking.web.validate().map_err(|e| Error::InvalidConfig(format!("chunking.web: {e}")))?;
        if self.retrieval.top_k == 0 { return Err(Error::InvalidConfig("retrieval.top_k must be > 0".into())); }
        if self.retrieval.embed_batch_size == 0 { return Err(Error::InvalidConfig("retrieval.embed_batch_size must be > 0".into())); }
        if self.recommend.top_k == 0 { return Err(Error::InvalidConfig("recommend.top_k must be > 0".into())); }
        if self.embedding.max_len == 0 { return Err(Error::InvalidConfig("embedding.max_len must be > 0".into())); }
        Ok(())
    }

    pub fn model_dir(&self) -> PathBuf { expand_path(&self.embedding.model_dir) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.chunking.document.max_chars, 900);
        assert_eq!(settings.portal.base_url, DEFAULT_PORTAL_URL);
    }

    #[test]
    fn files_and_env_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[retrieval]\ntop_k = 8\n[llm]\nmodel = \"file-model\"\n")?;
            jail.create_file("config.test.toml", "[recommend]\ntop_k = 3\n")?;
            jail.set_env("RUST_ENV", "test");
            jail.set_env("APP_LLM__MODEL", "env-model");

            let config = Config::load().map_err(|e| e.to_string())?;
            let settings = config.settings().map_err(|e| e.to_string())?;
            assert_eq!(settings.retrieval.top_k, 8);
            assert_eq!(settings.recommend.top_k, 3);
            assert_eq!(settings.llm.model, "env-model");
            assert_eq!(settings.chunking.web.max_chars, 1200);
            let top_k: usize = config.get("retrieval.top_k").map_err(|e| e.to_string())?;
            assert_eq!(top_k, 8);
            Ok(())
        });
    }

    #[test]
    fn invalid_window_is_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[chunking.document]\nmax_chars = 100\noverlap = 100\nmin_chars = 10\n")?;
            jail.set_env("RUST_ENV", "dev");
            assert!(matches!(Config::load(), Err(Error::InvalidConfig(_))));
            Ok(())
        });
    }

    #[test]
    fn min_chars_above_max_chars_is_rejected() {
        let mut settings = Settings::default();
        settings.chunking.web.min_chars = settings.chunking.web.max_chars + 1;
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref m) if m.starts_with("chunking.web")), "{err}");
    }

    #[test]
    fn model_dir_expands_env_vars() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PGRKAM_MODELS", "/srv/pgrkam/models");
            let mut settings = Settings::default();
            settings.embedding.model_dir = "${PGRKAM_MODELS}/minilm".to_string();
            assert_eq!(settings.model_dir(), PathBuf::from("/srv/pgrkam/models/minilm"));
            Ok(())
        });
    }
}
