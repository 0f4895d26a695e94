use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A caller broke an input contract (mismatched lengths, bad window, ...).
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// An embedding or completion provider failed; `message` is upstream's.
    #[error("{provider} provider failed: {message}")]
    Provider { provider: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider { provider: provider.into(), message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
