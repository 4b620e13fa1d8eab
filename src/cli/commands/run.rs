//! Run and submit commands.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::dataset::load_questions;
use crate::orchestrator::{load_run, Orchestrator};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Run the run command.
pub async fn run_batch(
    questions_path: Option<PathBuf>,
    offset: usize,
    limit: Option<usize>,
    submit: bool,
    username: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Answer, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'svar doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    if submit {
        preflight::check(Operation::Submit, &settings)?;
    }

    let orchestrator = Orchestrator::new(settings)?;

    let questions = match &questions_path {
        Some(path) => load_questions(path, offset, limit)?,
        None => {
            let all = orchestrator.scoring().fetch_questions().await?;
            all.into_iter()
                .skip(offset)
                .take(limit.unwrap_or(usize::MAX))
                .collect()
        }
    };

    if questions.is_empty() {
        Output::warning("No questions to answer.");
        return Ok(());
    }

    Output::info(&format!(
        "Answering {} question(s) with {}",
        questions.len(),
        orchestrator.model_name()
    ));

    let records = orchestrator.answer_all(&questions).await;

    Output::header("Answers");
    for record in &records {
        Output::answer(record);
    }

    let failed = records.iter().filter(|r| r.is_error()).count();
    if failed > 0 {
        Output::warning(&format!("{} question(s) failed.", failed));
    }

    let run_path = orchestrator.save_run(&records)?;
    Output::success(&format!("Saved run to {}", run_path.display()));

    if submit {
        let result = orchestrator
            .submit(username.as_deref(), None, &records)
            .await?;
        Output::score(&result);
    } else {
        Output::info(&format!(
            "Submit later with: svar submit {}",
            run_path.display()
        ));
    }

    Ok(())
}

/// Run the submit command.
pub async fn run_submit(run: &Path, username: Option<String>, settings: Settings) -> Result<()> {
    preflight::check(Operation::Submit, &settings)?;

    let run = load_run(run)?;
    let orchestrator = Orchestrator::new(settings)?;

    Output::info(&format!(
        "Submitting {} answer(s) from a {} run on {}",
        run.answers.len(),
        run.model,
        run.created_at.format("%Y-%m-%d %H:%M")
    ));

    let spinner = Output::spinner("Waiting for the scoring API...");
    let result = orchestrator
        .submit(username.as_deref(), None, &run.answers)
        .await;
    spinner.finish_and_clear();

    Output::score(&result?);
    Ok(())
}
