//! HTTP client for the course scoring API.

use super::models::{Question, Submission, SubmissionResult};
use crate::config::ScoringSettings;
use crate::error::{Result, SvarError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Client for fetching questions, attachments and submitting answers.
#[derive(Clone)]
pub struct ScoringClient {
    http: reqwest::Client,
    base_url: String,
}

impl ScoringClient {
    /// Create a client from scoring settings.
    pub fn new(settings: &ScoringSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self::with_http_client(http, &settings.base_url))
    }

    /// Create a client around an existing HTTP client.
    pub fn with_http_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL of the scoring service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the full question set.
    #[instrument(skip(self))]
    pub async fn fetch_questions(&self) -> Result<Vec<Question>> {
        let url = format!("{}/questions", self.base_url);
        let response = self.http.get(&url).send().await?;
        let questions: Vec<Question> = check_status(response).await?.json().await?;

        info!("Fetched {} questions", questions.len());
        Ok(questions)
    }

    /// Fetch a single random question.
    #[instrument(skip(self))]
    pub async fn random_question(&self) -> Result<Question> {
        let url = format!("{}/random-question", self.base_url);
        let response = self.http.get(&url).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Download the raw bytes of a task's attached file.
    #[instrument(skip(self))]
    pub async fn download_file(&self, task_id: &str) -> Result<Vec<u8>> {
        validate_task_id(task_id)?;
        let url = format!("{}/files/{}", self.base_url, task_id);
        debug!("Downloading attachment from {}", url);

        let response = self.http.get(&url).send().await?;
        let bytes = check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Download a question's attachment into `{dir}/{task_id}/{file_name}`.
    ///
    /// Returns `None` for questions without an attachment and the cached path when
    /// the file was already downloaded.
    #[instrument(skip(self, question, dir), fields(task_id = %question.task_id))]
    pub async fn download_attachment(
        &self,
        question: &Question,
        dir: &Path,
    ) -> Result<Option<PathBuf>> {
        if !question.has_attachment() {
            return Ok(None);
        }

        let task_id = validate_task_id(&question.task_id)?;
        let file_name = sanitize_file_name(&question.file_name)?;
        let task_dir = dir.join(task_id);
        let target = task_dir.join(file_name);

        if target.exists() {
            debug!("Using cached attachment {}", target.display());
            return Ok(Some(target));
        }

        let bytes = self.download_file(&question.task_id).await?;
        tokio::fs::create_dir_all(&task_dir).await?;
        tokio::fs::write(&target, &bytes).await?;

        info!("Saved {} ({} bytes)", target.display(), bytes.len());
        Ok(Some(target))
    }

    /// Submit answers for scoring.
    #[instrument(skip(self, submission), fields(username = %submission.username, answers = submission.answers.len()))]
    pub async fn submit(&self, submission: &Submission) -> Result<SubmissionResult> {
        let url = format!("{}/submit", self.base_url);
        let response = self.http.post(&url).json(submission).send().await?;
        let result: SubmissionResult = check_status(response).await?.json().await?;

        info!("Submission scored: {}", result);
        Ok(result)
    }
}

/// Turn non-success responses into scoring errors, preferring the API's `detail` field.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| match &v["detail"] {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        })
        .unwrap_or(body);

    Err(SvarError::Scoring(format!("HTTP {}: {}", status.as_u16(), detail)))
}

/// Task ids become a directory name, so only ASCII letters, digits, `-` and `_` pass.
pub fn validate_task_id(task_id: &str) -> Result<&str> {
    let valid = !task_id.is_empty()
        && task_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(task_id)
    } else {
        Err(SvarError::InvalidInput(format!("Invalid task id: {:?}", task_id)))
    }
}

/// Reject file names that would escape the task directory.
fn sanitize_file_name(name: &str) -> Result<&str> {
    let name = name.trim();
    let is_plain = Path::new(name)
        .file_name()
        .is_some_and(|f| f.to_str() == Some(name));

    if is_plain {
        Ok(name)
    } else {
        Err(SvarError::Attachment(format!("Unsafe attachment name: {}", name)))
    }
}
