//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, SvarError};
use crate::openai::is_api_key_configured;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering questions requires an LLM API key.
    Answer,
    /// Submitting requires a username and agent code URL.
    Submit,
    /// Fetching questions has no local requirements.
    Fetch,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Answer => check_api_key(settings)?,
        Operation::Submit => check_agent_code(settings)?,
        Operation::Fetch => {}
    }
    Ok(())
}

fn check_api_key(settings: &Settings) -> Result<()> {
    if is_api_key_configured(&settings.llm) {
        return Ok(());
    }
    Err(SvarError::Config(format!(
        "{} is not set. Set it with: export {}='...'",
        settings.llm.api_key_env, settings.llm.api_key_env
    )))
}

fn check_agent_code(settings: &Settings) -> Result<()> {
    match settings.scoring.agent_code.as_deref() {
        Some(code) if !code.trim().is_empty() => Ok(()),
        _ => Err(SvarError::Config(
            "No agent code URL. Set scoring.agent_code in the config or SPACE_ID in the environment."
                .to_string(),
        )),
    }
}
