//! Pipeline orchestrator for Svar.
//!
//! Coordinates the whole process for a question: attachment download, content
//! building, the agent run and, for batches, saving and submitting answers.

use crate::agent::{Agent, OpenAiChat, ToolContext};
use crate::config::{Prompts, Settings};
use crate::content::ContentBuilder;
use crate::error::{Result, SvarError};
use crate::openai::create_client;
use crate::research::ResearchClient;
use crate::scoring::{AnswerPayload, Question, ScoringClient, Submission, SubmissionResult};
use crate::transcription::{Transcriber, WhisperTranscriber};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The answer produced for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub task_id: String,
    pub question: String,
    /// Normalised answer, or `Error: ...` when the run failed.
    pub submitted_answer: String,
    #[serde(default)]
    pub iterations: usize,
    #[serde(default)]
    pub tool_calls: usize,
    #[serde(default)]
    pub forced_final: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnswerRecord {
    fn failed(question: &Question, error: &SvarError) -> Self {
        Self {
            task_id: question.task_id.clone(),
            question: question.question.clone(),
            submitted_answer: format!("Error: {}", error),
            iterations: 0,
            tool_calls: 0,
            forced_final: false,
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A saved batch of answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFile {
    pub created_at: DateTime<Utc>,
    pub model: String,
    pub answers: Vec<AnswerRecord>,
}

/// The main orchestrator for the Svar pipeline.
pub struct Orchestrator {
    settings: Settings,
    scoring: ScoringClient,
    builder: ContentBuilder,
    agent: Agent,
}

impl Orchestrator {
    /// Create a new orchestrator from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let client = create_client(&settings.llm)?;
        let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperTranscriber::new(
            client.clone(),
            &settings.transcription.model,
        ));
        let model = Arc::new(OpenAiChat::new(client, &settings.llm));
        let research = Arc::new(ResearchClient::new(settings.tools.clone())?);

        info!("Using model {}", settings.llm.model);

        let agent = Agent::new(model, ToolContext::new(research), prompts)
            .with_max_iterations(settings.agent.max_iterations)
            .with_retry_attempts(settings.llm.retry_attempts);
        let scoring = ScoringClient::new(&settings.scoring)?;

        Ok(Self::with_components(
            settings,
            scoring,
            ContentBuilder::new(Some(transcriber)),
            agent,
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        scoring: ScoringClient,
        builder: ContentBuilder,
        agent: Agent,
    ) -> Self {
        Self {
            settings,
            scoring,
            builder,
            agent,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the scoring API client.
    pub fn scoring(&self) -> &ScoringClient {
        &self.scoring
    }

    /// Name of the model answering questions.
    pub fn model_name(&self) -> &str {
        self.agent.model_name()
    }

    /// Answer a question, downloading its attachment if it has one.
    ///
    /// Never fails: problems are recorded on the returned [`AnswerRecord`].
    #[instrument(skip(self, question), fields(task_id = %question.task_id))]
    pub async fn answer(&self, question: &Question) -> AnswerRecord {
        let attachment = match self
            .scoring
            .download_attachment(question, &self.settings.resources_dir())
            .await
        {
            Ok(path) => path,
            Err(e) => {
                warn!("Attachment unavailable for {}: {}", question.task_id, e);
                None
            }
        };

        self.answer_with_attachment(question, attachment.as_deref())
            .await
    }

    /// Answer a question using an attachment that is already on disk.
    pub async fn answer_with_attachment(
        &self,
        question: &Question,
        attachment: Option<&Path>,
    ) -> AnswerRecord {
        let content = self.builder.build(question, attachment).await;

        match self.agent.run(&content).await {
            Ok(response) => {
                info!(
                    "Answered {} in {} iterations: {}",
                    question.task_id, response.iterations, response.answer
                );
                AnswerRecord {
                    task_id: question.task_id.clone(),
                    question: question.question.clone(),
                    submitted_answer: response.answer,
                    iterations: response.iterations,
                    tool_calls: response.tool_calls.len(),
                    forced_final: response.forced_final,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Agent failed on {}: {}", question.task_id, e);
                AnswerRecord::failed(question, &e)
            }
        }
    }

    /// Answer a batch of questions with bounded concurrency. Results keep input order.
    pub async fn answer_all(&self, questions: &[Question]) -> Vec<AnswerRecord> {
        let pb = ProgressBar::new(questions.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Answering [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );

        let pending: Vec<_> = questions
            .iter()
            .enumerate()
            .map(|(idx, question)| self.answer(question).map(move |record| (idx, record)))
            .collect();

        let mut answered: Vec<(usize, AnswerRecord)> = stream::iter(pending)
            .buffer_unordered(self.settings.agent.concurrency.max(1))
            .inspect(|(_, record)| {
                pb.set_message(record.task_id.chars().take(8).collect::<String>());
                pb.inc(1);
            })
            .collect()
            .await;

        pb.finish_and_clear();

        answered.sort_by_key(|(idx, _)| *idx);
        answered.into_iter().map(|(_, record)| record).collect()
    }

    /// Save a run to `{data_dir}/runs/run-<timestamp>.json`.
    pub fn save_run(&self, records: &[AnswerRecord]) -> Result<PathBuf> {
        let created_at = Utc::now();
        let run = RunFile {
            created_at,
            model: self.model_name().to_string(),
            answers: records.to_vec(),
        };

        let dir = self.settings.runs_dir();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("run-{}.json", created_at.format("%Y%m%d-%H%M%S-%3f")));
        std::fs::write(&path, serde_json::to_string_pretty(&run)?)?;

        info!("Saved {} answers to {}", records.len(), path.display());
        Ok(path)
    }

    /// Submit answers, skipping failed ones.
    ///
    /// `username` and `agent_code` fall back to the scoring settings.
    pub async fn submit(
        &self,
        username: Option<&str>,
        agent_code: Option<&str>,
        records: &[AnswerRecord],
    ) -> Result<SubmissionResult> {
        let submission = build_submission(
            username.or(self.settings.scoring.username.as_deref()),
            agent_code.or(self.settings.scoring.agent_code.as_deref()),
            records,
        )?;
        self.scoring.submit(&submission).await
    }
}

/// Load a saved run.
pub fn load_run(path: &Path) -> Result<RunFile> {
    if !path.exists() {
        return Err(SvarError::InvalidInput(format!(
            "Run file not found: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn build_submission(
    username: Option<&str>,
    agent_code: Option<&str>,
    records: &[AnswerRecord],
) -> Result<Submission> {
    let username = username
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            SvarError::Config(
                "No username to submit as. Pass --username or set HF_USERNAME.".to_string(),
            )
        })?;
    let agent_code = agent_code
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            SvarError::Config(
                "No agent code URL. Set scoring.agent_code or SPACE_ID.".to_string(),
            )
        })?;

    let answers: Vec<AnswerPayload> = records
        .iter()
        .filter(|r| !r.is_error())
        .map(|r| AnswerPayload {
            task_id: r.task_id.clone(),
            submitted_answer: r.submitted_answer.clone(),
        })
        .collect();

    if answers.is_empty() {
        return Err(SvarError::InvalidInput(
            "No answers to submit".to_string(),
        ));
    }

    let skipped = records.len() - answers.len();
    if skipped > 0 {
        warn!("Skipping {} failed answers", skipped);
    }

    Ok(Submission {
        username: username.to_string(),
        agent_code: agent_code.to_string(),
        answers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ChatModel, ModelTurn};
    use crate::config::ToolSettings;
    use async_openai::types::{ChatCompletionRequestMessage, ChatCompletionTool};
    use async_trait::async_trait;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Answers with the last word of the question, or fails when asked to.
    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            messages: &[ChatCompletionRequestMessage],
            _tools: Option<&[ChatCompletionTool]>,
        ) -> Result<ModelTurn> {
            let text = match messages.last() {
                Some(ChatCompletionRequestMessage::User(msg)) => format!("{:?}", msg.content),
                _ => String::new(),
            };
            if text.contains("fail") {
                return Err(SvarError::Agent("model refused".to_string()));
            }
            let word = text
                .trim_matches(|c: char| !c.is_alphanumeric())
                .rsplit(' ')
                .next()
                .unwrap_or("")
                .to_string();
            Ok(ModelTurn {
                content: Some(format!("FINAL ANSWER: {}", word)),
                tool_calls: Vec::new(),
            })
        }
    }

    fn orchestrator(data_dir: &Path, scoring_url: &str) -> Orchestrator {
        let mut settings = Settings::default();
        settings.general.data_dir = data_dir.to_string_lossy().to_string();
        settings.agent.concurrency = 3;

        let research = ResearchClient::with_http_client(reqwest::Client::new(), ToolSettings::default());
        let agent = Agent::new(
            Arc::new(EchoModel),
            ToolContext::new(Arc::new(research)),
            Prompts::default(),
        );

        Orchestrator::with_components(
            settings,
            ScoringClient::with_http_client(reqwest::Client::new(), scoring_url),
            ContentBuilder::new(None),
            agent,
        )
    }

    fn record(task_id: &str, answer: &str, error: Option<&str>) -> AnswerRecord {
        AnswerRecord {
            task_id: task_id.to_string(),
            question: "q".to_string(),
            submitted_answer: answer.to_string(),
            iterations: 1,
            tool_calls: 0,
            forced_final: false,
            error: error.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_answer_all_keeps_order_and_records_errors() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), "http://127.0.0.1:9");

        let questions = vec![
            Question::new("a", "Say alpha"),
            Question::new("b", "Please fail"),
            Question::new("c", "Say gamma"),
        ];
        let records = orch.answer_all(&questions).await;

        let ids: Vec<_> = records.iter().map(|r| r.task_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(records[0].submitted_answer, "alpha");
        assert!(records[1].is_error());
        assert!(records[1].submitted_answer.starts_with("Error: "));
        assert_eq!(records[2].submitted_answer, "gamma");
    }

    #[tokio::test]
    async fn test_missing_attachment_does_not_fail_question() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/x"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "No file"})))
            .mount(&server)
            .await;

        let orch = orchestrator(dir.path(), &server.uri());
        let mut question = Question::new("x", "What is in the image");
        question.file_name = "board.png".to_string();

        let record = orch.answer(&question).await;
        assert!(!record.is_error());
    }

    #[test]
    fn test_save_and_load_run() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), "http://127.0.0.1:9");

        let records = vec![record("a", "3", None), record("b", "Error: x", Some("x"))];
        let path = orch.save_run(&records).unwrap();
        assert!(path.starts_with(dir.path().join("runs")));

        let run = load_run(&path).unwrap();
        assert_eq!(run.model, "echo");
        assert_eq!(run.answers, records);
    }

    #[test]
    fn test_load_missing_run() {
        assert!(matches!(
            load_run(Path::new("/nonexistent/run.json")),
            Err(SvarError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_build_submission_skips_errors() {
        let records = vec![record("a", "3", None), record("b", "Error: x", Some("x"))];
        let submission = build_submission(Some("alice"), Some("https://example.com/code"), &records).unwrap();
        assert_eq!(submission.answers.len(), 1);
        assert_eq!(submission.answers[0].task_id, "a");

        assert!(build_submission(None, Some("code"), &records).is_err());
        assert!(build_submission(Some("alice"), None, &records).is_err());
        assert!(build_submission(Some("alice"), Some("code"), &records[1..]).is_err());
    }

    #[tokio::test]
    async fn test_submit() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(body_partial_json(json!({"username": "alice"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "username": "alice",
                "score": 100.0,
                "correct_count": 1,
                "total_attempted": 1,
                "message": "ok",
                "timestamp": "2025-01-01T00:00:00"
            })))
            .mount(&server)
            .await;

        let orch = orchestrator(dir.path(), &server.uri());
        let result = orch
            .submit(Some("alice"), Some("https://example.com/code"), &[record("a", "3", None)])
            .await
            .unwrap();
        assert_eq!(result.correct_count, 1);
    }
}
