//! Fetch command - download questions and attachments for local runs.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::dataset::fetch_dev_data;
use crate::scoring::ScoringClient;
use anyhow::Result;

/// Run the fetch command.
pub async fn run_fetch(settings: Settings) -> Result<()> {
    preflight::check(Operation::Fetch, &settings)?;

    let client = ScoringClient::new(&settings.scoring)?;
    let data_dir = settings.data_dir();

    Output::info(&format!("Fetching questions from {}", client.base_url()));
    let spinner = Output::spinner("Downloading questions and attachments...");
    let summary = fetch_dev_data(&client, &data_dir).await;
    spinner.finish_and_clear();
    let summary = summary?;

    Output::success(&format!(
        "Saved {} questions to {}",
        summary.questions,
        settings.questions_path().display()
    ));
    Output::kv(
        "Attachments",
        &format!("{}/{} downloaded", summary.downloaded, summary.total_resources),
    );
    Output::kv("Location", &settings.resources_dir().display().to_string());

    if summary.failed > 0 {
        Output::warning(&format!(
            "{} attachment(s) could not be downloaded. Run with -v for details.",
            summary.failed
        ));
    }

    Ok(())
}
