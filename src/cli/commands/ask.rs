//! Ask and random commands.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{AnswerRecord, Orchestrator};
use crate::scoring::{validate_task_id, Question};
use anyhow::Result;
use std::path::PathBuf;

/// Task ID used for questions that do not come from the scoring API.
const LOCAL_TASK_ID: &str = "local";

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    task_id: Option<String>,
    file_name: Option<String>,
    file: Option<PathBuf>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Answer, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'svar doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(id) = &task_id {
        validate_task_id(id)?;
    }

    if let Some(path) = &file {
        if !path.is_file() {
            anyhow::bail!("Attachment not found: {}", path.display());
        }
    }

    let orchestrator = Orchestrator::new(settings)?;

    let mut q = Question::new(task_id.unwrap_or_else(|| LOCAL_TASK_ID.to_string()), question);
    if let Some(name) = file_name {
        q.file_name = name;
    }

    let spinner = Output::spinner("Thinking...");
    let record = match &file {
        Some(path) => orchestrator.answer_with_attachment(&q, Some(path)).await,
        None => orchestrator.answer(&q).await,
    };
    spinner.finish_and_clear();

    print_record(&record)
}

/// Run the random command.
pub async fn run_random(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Answer, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'svar doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Fetching a random question...");
    let question = orchestrator.scoring().random_question().await;
    spinner.finish_and_clear();
    let question = question?;

    Output::header("Question");
    println!("{}", question.question);
    Output::kv("Task", &question.task_id);
    if let Some(level) = &question.level {
        Output::kv("Level", level);
    }
    if question.has_attachment() {
        Output::kv("Attachment", &question.file_name);
    }

    let spinner = Output::spinner("Thinking...");
    let record = orchestrator.answer(&question).await;
    spinner.finish_and_clear();

    print_record(&record)
}

fn print_record(record: &AnswerRecord) -> Result<()> {
    if let Some(error) = &record.error {
        Output::error(&format!("Failed to answer: {}", error));
        anyhow::bail!("{}", error);
    }

    println!("\n{}\n", record.submitted_answer);
    Output::kv("Iterations", &record.iterations.to_string());
    Output::kv("Tool calls", &record.tool_calls.to_string());
    if record.forced_final {
        Output::warning("Answer was forced after the iteration budget ran out.");
    }
    Ok(())
}
