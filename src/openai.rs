//! OpenAI client configuration with sensible defaults.

use crate::config::LlmSettings;
use crate::error::{is_transient_http, Result, SvarError};
use async_openai::error::OpenAIError;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client from the LLM settings.
///
/// The API key is read from the environment variable named in `api_key_env`.
/// `api_base` points the client at any OpenAI-compatible endpoint.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .build()?;

    Ok(Client::with_config(client_config(settings)).with_http_client(http_client))
}

fn client_config(settings: &LlmSettings) -> OpenAIConfig {
    let mut config = OpenAIConfig::default();

    if let Ok(key) = std::env::var(&settings.api_key_env) {
        config = config.with_api_key(key);
    }
    if let Some(base) = &settings.api_base {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    config
}

/// Check whether the configured API key variable is set and non-empty.
pub fn is_api_key_configured(settings: &LlmSettings) -> bool {
    std::env::var(&settings.api_key_env).is_ok_and(|key| !key.trim().is_empty())
}

/// Map an async-openai error to a Svar error.
///
/// Providers that cannot combine function calling with the request (for example
/// multimodal models answering `400 INVALID_ARGUMENT`) map to
/// [`SvarError::ToolUseUnsupported`] so callers can retry without tools.
pub fn map_api_error(err: OpenAIError) -> SvarError {
    let message = err.to_string();
    if is_tool_use_unsupported(&message) {
        return SvarError::ToolUseUnsupported(message);
    }

    let transient = match &err {
        OpenAIError::Reqwest(e) => is_transient_http(e),
        OpenAIError::ApiError(_) => is_transient_message(&message),
        _ => false,
    };

    if transient {
        SvarError::OpenAITransient(message)
    } else {
        SvarError::OpenAI(message)
    }
}

/// Rate limits and overloads as reported in API error bodies.
fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    [
        "rate limit",
        "rate_limit",
        "resource_exhausted",
        "resource has been exhausted",
        "overloaded",
        "server_error",
        "server error",
        "temporarily unavailable",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}

fn is_tool_use_unsupported(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("function calling is unsupported")
        || lower.contains("tool use is not supported")
        || lower.contains("does not support tools")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_tool_use_rejection() {
        assert!(is_tool_use_unsupported(
            "Tool use with function calling is unsupported"
        ));
        assert!(is_tool_use_unsupported("model does not support tools"));
        assert!(!is_tool_use_unsupported("Rate limit reached"));
    }

    #[test]
    fn test_only_transient_api_errors_are_retryable() {
        let api_error = |message: &str| {
            OpenAIError::ApiError(async_openai::error::ApiError {
                message: message.to_string(),
                r#type: None,
                param: None,
                code: None,
            })
        };

        let err = map_api_error(api_error("Rate limit reached for gpt-4o"));
        assert!(matches!(err, SvarError::OpenAITransient(_)));
        assert!(err.is_retryable());

        let err = map_api_error(api_error("Incorrect API key provided: sk-...abcd"));
        assert!(matches!(err, SvarError::OpenAI(_)));
        assert!(!err.is_retryable());

        let err = map_api_error(api_error("Invalid value for 'max_completion_tokens'"));
        assert!(!err.is_retryable());

        let err = map_api_error(OpenAIError::InvalidArgument("bad request".to_string()));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_missing_api_key_env() {
        let settings = LlmSettings {
            api_key_env: "SVAR_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmSettings::default()
        };
        assert!(!is_api_key_configured(&settings));
        assert!(create_client(&settings).is_ok());
    }
}
