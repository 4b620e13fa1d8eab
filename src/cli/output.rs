//! CLI output formatting utilities.

use crate::orchestrator::AnswerRecord;
use crate::scoring::SubmissionResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print one answered question.
    pub fn answer(record: &AnswerRecord) {
        let marker = if record.is_error() {
            style("✗").red()
        } else {
            style("✓").green()
        };
        println!(
            "  {} {} {}",
            marker,
            style(short_id(&record.task_id)).dim(),
            style(&record.submitted_answer).bold()
        );
        println!("    {}", style(preview(&record.question, 100)).dim());
    }

    /// Print a scoring result.
    pub fn score(result: &SubmissionResult) {
        Output::header("Score");
        Output::kv("User", &result.username);
        Output::kv(
            "Score",
            &format!(
                "{:.1}% ({}/{} correct)",
                result.score, result.correct_count, result.total_attempted
            ),
        );
        if !result.message.is_empty() {
            Output::kv("Message", &result.message);
        }
    }

    /// Create a progress bar.
    pub fn progress_bar(len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// First eight characters of a task ID.
fn short_id(task_id: &str) -> String {
    task_id.chars().take(8).collect()
}

/// Single-line preview of a long text.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max_chars {
        format!("{}...", flat.chars().take(max_chars).collect::<String>())
    } else {
        flat
    }
}
