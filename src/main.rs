//! Svar CLI entry point.

use anyhow::Result;
use clap::Parser;
use svar::cli::{commands, Cli, Commands};
use svar::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.as_ref().map(|p| Settings::expand_path(p));
    let settings = match &config_path {
        Some(path) => Settings::load_from(Some(path))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("svar={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Fetch => {
            commands::run_fetch(settings).await?;
        }

        Commands::Ask {
            question,
            task_id,
            file_name,
            file,
        } => {
            commands::run_ask(question, task_id.clone(), file_name.clone(), file.clone(), settings)
                .await?;
        }

        Commands::Random => {
            commands::run_random(settings).await?;
        }

        Commands::Run {
            questions,
            offset,
            limit,
            submit,
            username,
        } => {
            commands::run_batch(
                questions.clone(),
                *offset,
                *limit,
                *submit,
                username.clone(),
                settings,
            )
            .await?;
        }

        Commands::Submit { run, username } => {
            commands::run_submit(run, username.clone(), settings).await?;
        }

        Commands::Tools => {
            commands::run_tools(settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
