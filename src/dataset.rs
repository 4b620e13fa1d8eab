//! Local copy of the question set and its attachments.
//!
//! Questions are stored as pretty-printed JSON in `{data_dir}/questions.json` and
//! attachments under `{data_dir}/resources/{task_id}/{file_name}`.

use crate::error::{Result, SvarError};
use crate::scoring::{Question, ScoringClient};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Outcome of a dev-data download.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadSummary {
    /// Number of questions fetched.
    pub questions: usize,
    /// Number of questions that reference an attachment.
    pub total_resources: usize,
    /// Attachments stored successfully (including cached ones).
    pub downloaded: usize,
    /// Attachments that could not be downloaded.
    pub failed: usize,
}

/// Fetch all questions and their attachments into `data_dir`.
///
/// A failed attachment download is logged and counted but does not abort the run.
#[instrument(skip(client))]
pub async fn fetch_dev_data(client: &ScoringClient, data_dir: &Path) -> Result<DownloadSummary> {
    let questions = client.fetch_questions().await?;
    save_questions(&data_dir.join("questions.json"), &questions)?;

    let resources_dir = data_dir.join("resources");
    let mut summary = DownloadSummary {
        questions: questions.len(),
        ..Default::default()
    };

    for question in questions.iter().filter(|q| q.has_attachment()) {
        summary.total_resources += 1;
        match client.download_attachment(question, &resources_dir).await {
            Ok(_) => summary.downloaded += 1,
            Err(e) => {
                warn!(
                    "Failed to download {} for {}: {}",
                    question.file_name, question.task_id, e
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        "Downloaded {}/{} resources",
        summary.downloaded, summary.total_resources
    );
    Ok(summary)
}

/// Write questions to a JSON file, creating parent directories.
pub fn save_questions(path: &Path, questions: &[Question]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(questions)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load questions from a JSON file, skipping `offset` and keeping at most `limit`.
pub fn load_questions(path: &Path, offset: usize, limit: Option<usize>) -> Result<Vec<Question>> {
    if !path.exists() {
        return Err(SvarError::InvalidInput(format!(
            "Question file not found: {}. Run 'svar fetch' first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let questions: Vec<Question> = serde_json::from_str(&content)?;

    Ok(questions
        .into_iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .collect())
}
