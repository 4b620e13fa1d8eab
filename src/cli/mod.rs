//! CLI module for Svar.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Svar - a research agent for benchmark questions
///
/// Fetches questions from the scoring API, answers them with a tool-using LLM agent
/// and submits the answers. The name "Svar" is the Norwegian word for "answer."
#[derive(Parser, Debug)]
#[command(name = "svar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check configuration, API key and scoring API reachability
    Doctor,

    /// Download the question set and every attachment into the data directory
    Fetch,

    /// Answer a single question
    Ask {
        /// The question text
        question: String,

        /// Task ID, used to download the question's attachment from the scoring API
        #[arg(short, long)]
        task_id: Option<String>,

        /// Attachment file name as listed by the scoring API (requires --task-id)
        #[arg(long, requires = "task_id")]
        file_name: Option<String>,

        /// Local file to attach instead of downloading one
        #[arg(short, long, conflicts_with = "file_name")]
        file: Option<PathBuf>,
    },

    /// Fetch a random question from the scoring API and answer it
    Random,

    /// Answer a batch of questions and save the run
    Run {
        /// Questions file (defaults to the live scoring API)
        #[arg(short, long)]
        questions: Option<PathBuf>,

        /// Skip this many questions
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Answer at most this many questions
        #[arg(short, long)]
        limit: Option<usize>,

        /// Submit the answers after the run
        #[arg(short, long)]
        submit: bool,

        /// Username for submission (defaults to scoring.username / HF_USERNAME)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Submit a saved run for scoring
    Submit {
        /// Run file written by `svar run`
        run: PathBuf,

        /// Username for submission (defaults to scoring.username / HF_USERNAME)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Smoke-test every research and math tool
    Tools,

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from(["svar", "-v", "run", "--limit", "5", "--submit"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run {
                limit,
                submit,
                offset,
                questions,
                ..
            } => {
                assert_eq!(limit, Some(5));
                assert!(submit);
                assert_eq!(offset, 0);
                assert!(questions.is_none());
            }
            other => panic!("Expected Run, got {:?}", other),
        }
    }

    #[test]
    fn test_file_name_requires_task_id() {
        assert!(Cli::try_parse_from(["svar", "ask", "q", "--file-name", "a.png"]).is_err());
        assert!(Cli::try_parse_from(["svar", "ask", "q", "-t", "abc", "--file-name", "a.png"]).is_ok());
    }
}
