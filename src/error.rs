//! Error types for Svar.

use thiserror::Error;

/// Library-level error type for Svar operations.
#[derive(Error, Debug)]
pub enum SvarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scoring API error: {0}")]
    Scoring(String),

    #[error("Attachment error: {0}")]
    Attachment(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Research tool failed: {0}")]
    Research(String),

    #[error("Math error: {0}")]
    Math(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("OpenAI API temporarily unavailable: {0}")]
    OpenAITransient(String),

    #[error("Model rejected tool use: {0}")]
    ToolUseUnsupported(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl SvarError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SvarError::OpenAITransient(_) => true,
            SvarError::Http(e) => is_transient_http(e),
            _ => false,
        }
    }
}

/// Timeouts, connection failures, rate limits and server errors.
pub(crate) fn is_transient_http(err: &reqwest::Error) -> bool {
    err.is_timeout()
        || err.is_connect()
        || err
            .status()
            .is_some_and(|s| s.is_server_error() || s == reqwest::StatusCode::TOO_MANY_REQUESTS)
}

/// Result type alias for Svar operations.
pub type Result<T> = std::result::Result<T, SvarError>;
