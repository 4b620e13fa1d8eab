//! Tools command - run every agent tool once against live services.

use crate::agent::{ToolCall, ToolContext};
use crate::cli::Output;
use crate::config::Settings;
use crate::research::ResearchClient;
use anyhow::Result;
use console::style;
use std::sync::Arc;

/// Sample invocations covering each tool.
fn sample_calls() -> Vec<ToolCall> {
    vec![
        ToolCall::SearchWikipedia {
            query: "Mercedes Sosa".to_string(),
            top_k: Some(1),
            chars_max: Some(300),
        },
        ToolCall::SearchArxiv {
            query: "attention is all you need".to_string(),
            max_results: Some(1),
        },
        ToolCall::WebSearch {
            query: "capital of France".to_string(),
            max_results: Some(3),
        },
        ToolCall::UrlContent {
            url: "https://en.wikipedia.org/wiki/Rust_(programming_language)".to_string(),
        },
        ToolCall::Calculate {
            expression: "sqrt(16) + 2**3 * sin(pi/2)".to_string(),
        },
        ToolCall::SolveEquation {
            equation: "x**2 - 5*x + 6 = 0".to_string(),
            variable: "x".to_string(),
        },
        ToolCall::ReverseText {
            text: ".rewsna eht sa \"tfel\" drow eht fo etisoppo eht etirw".to_string(),
        },
        ToolCall::SortItems {
            items: vec!["sweet potatoes".into(), "basil".into(), "Broccoli".into()],
            descending: false,
        },
    ]
}

/// Run the tools command.
pub async fn run_tools(settings: Settings) -> Result<()> {
    let research = ResearchClient::new(settings.tools.clone())?;
    let tools = ToolContext::new(Arc::new(research));

    Output::header("Tool Check");

    let calls = sample_calls();
    let pb = Output::progress_bar(calls.len() as u64, "running tools");
    let mut results = Vec::new();
    for call in &calls {
        pb.set_message(call.name());
        results.push(tools.execute(call).await);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let mut failures = 0;
    for (call, result) in calls.iter().zip(results) {
        match result {
            Ok(output) => {
                println!("\n{} {}", style("✓").green(), style(call.name()).bold());
                let preview: String = output.chars().take(400).collect();
                for line in preview.lines() {
                    println!("    {}", style(line).dim());
                }
            }
            Err(e) => {
                failures += 1;
                println!("\n{} {} - {}", style("✗").red(), style(call.name()).bold(), e);
            }
        }
    }

    println!();
    if failures > 0 {
        Output::warning(&format!("{} of {} tools failed.", failures, calls.len()));
    } else {
        Output::success("All tools responded.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tool_definitions;

    #[test]
    fn test_samples_cover_every_tool() {
        let mut sampled: Vec<_> = sample_calls().iter().map(|c| c.name()).collect();
        let mut defined: Vec<_> = tool_definitions()
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        sampled.sort();
        defined.sort();
        assert_eq!(sampled, defined);
    }
}
