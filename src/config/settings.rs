//! Configuration settings for Svar.

use crate::error::{Result, SvarError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub scoring: ScoringSettings,
    pub llm: LlmSettings,
    pub agent: AgentSettings,
    pub transcription: TranscriptionSettings,
    pub tools: ToolSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for questions, downloaded resources and run results.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.svar".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Scoring API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    /// Base URL of the course scoring service.
    pub base_url: String,
    /// HuggingFace username used for submissions.
    pub username: Option<String>,
    /// Link to the agent's source code, sent along with submissions.
    pub agent_code: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            base_url: "https://agents-course-unit4-scoring.hf.space".to_string(),
            username: None,
            agent_code: None,
            timeout_seconds: 30,
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model used by the agent.
    pub model: String,
    /// OpenAI-compatible API base URL. None uses the OpenAI default.
    pub api_base: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens per completion.
    pub max_output_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Total attempts per model call, including the first.
    pub retry_attempts: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.1,
            max_output_tokens: 4096,
            timeout_seconds: 300,
            retry_attempts: 3,
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum model/tool rounds before the agent is forced to answer.
    pub max_iterations: usize,
    /// Questions answered in parallel during batch runs.
    pub concurrency: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 6,
            concurrency: 2,
        }
    }
}

/// Audio transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use for audio attachments.
    pub model: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
        }
    }
}

/// Research tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub wikipedia_base_url: String,
    /// Number of Wikipedia pages returned per search.
    pub wikipedia_top_k: usize,
    /// Maximum characters kept from each Wikipedia page.
    pub wikipedia_chars_max: usize,
    pub arxiv_base_url: String,
    pub arxiv_max_results: usize,
    /// Base URL of the DuckDuckGo HTML endpoint.
    pub search_base_url: String,
    pub search_max_results: usize,
    /// Maximum characters returned by the url_content tool.
    pub url_content_chars_max: usize,
    /// User-Agent header sent by research tools.
    pub user_agent: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            wikipedia_base_url: "https://en.wikipedia.org".to_string(),
            wikipedia_top_k: 3,
            wikipedia_chars_max: 2000,
            arxiv_base_url: "http://export.arxiv.org".to_string(),
            arxiv_max_results: 3,
            search_base_url: "https://html.duckduckgo.com".to_string(),
            search_max_results: 5,
            url_content_chars_max: 8000,
            user_agent: concat!("svar/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied on top of the file.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides()?;
        Ok(settings)
    }

    /// Apply overrides from process environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SVAR_API_BASE_URL") {
            self.scoring.base_url = v;
        }
        if let Some(v) = get("SVAR_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("SVAR_LLM_API_BASE") {
            self.llm.api_base = Some(v);
        }
        if let Some(v) = get("SVAR_TEMPERATURE") {
            self.llm.temperature = parse_override("SVAR_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("SVAR_MAX_OUTPUT_TOKENS") {
            self.llm.max_output_tokens = parse_override("SVAR_MAX_OUTPUT_TOKENS", &v)?;
        }
        if let Some(v) = get("SVAR_MAX_ITERATIONS") {
            self.agent.max_iterations = parse_override("SVAR_MAX_ITERATIONS", &v)?;
        }
        if let Some(v) = get("SVAR_LOG_LEVEL") {
            self.general.log_level = v;
        }
        if let Some(v) = get("HF_USERNAME") {
            self.scoring.username = Some(v);
        }
        if let Some(space_id) = get("SPACE_ID") {
            self.scoring.agent_code = Some(format!(
                "https://huggingface.co/spaces/{}/tree/main",
                space_id
            ));
        }

        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| SvarError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("svar")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Path of the cached question set.
    pub fn questions_path(&self) -> PathBuf {
        self.data_dir().join("questions.json")
    }

    /// Directory holding downloaded attachments, one folder per task.
    pub fn resources_dir(&self) -> PathBuf {
        self.data_dir().join("resources")
    }

    /// Directory holding saved answer runs.
    pub fn runs_dir(&self) -> PathBuf {
        self.data_dir().join("runs")
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SvarError::Config(format!("{} has an invalid value: {}", key, value)))
}
