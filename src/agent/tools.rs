//! Tool definitions and implementations for the agent system.

use crate::error::{Result, SvarError};
use crate::math;
use crate::research::ResearchClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Available tools for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Search the web.
    WebSearch {
        query: String,
        max_results: Option<usize>,
    },

    /// Read the text of a web page.
    UrlContent { url: String },

    /// Search Wikipedia.
    SearchWikipedia {
        query: String,
        top_k: Option<usize>,
        chars_max: Option<usize>,
    },

    /// Search arXiv for papers.
    SearchArxiv {
        query: String,
        max_results: Option<usize>,
    },

    /// Evaluate a math expression.
    Calculate { expression: String },

    /// Solve an equation for one variable.
    SolveEquation { equation: String, variable: String },

    /// Reverse a string character by character.
    ReverseText { text: String },

    /// Sort a list of strings.
    SortItems { items: Vec<String>, descending: bool },
}

impl ToolCall {
    /// Name the model uses for this tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::WebSearch { .. } => "web_search",
            ToolCall::UrlContent { .. } => "url_content",
            ToolCall::SearchWikipedia { .. } => "search_wikipedia",
            ToolCall::SearchArxiv { .. } => "search_arxiv",
            ToolCall::Calculate { .. } => "calculate",
            ToolCall::SolveEquation { .. } => "solve_equation",
            ToolCall::ReverseText { .. } => "reverse_text",
            ToolCall::SortItems { .. } => "sort_items",
        }
    }
}

/// Tool execution context with access to the research client.
pub struct ToolContext {
    pub research: Arc<ResearchClient>,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(research: Arc<ResearchClient>) -> Self {
        Self { research }
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        let settings = self.research.settings();

        match tool {
            ToolCall::WebSearch { query, max_results } => {
                self.research
                    .web_search(query, max_results.unwrap_or(settings.search_max_results))
                    .await
            }
            ToolCall::UrlContent { url } => {
                self.research
                    .fetch_url_text(url, settings.url_content_chars_max)
                    .await
            }
            ToolCall::SearchWikipedia {
                query,
                top_k,
                chars_max,
            } => {
                self.research
                    .search_wikipedia(
                        query,
                        top_k.unwrap_or(settings.wikipedia_top_k),
                        chars_max.unwrap_or(settings.wikipedia_chars_max),
                    )
                    .await
            }
            ToolCall::SearchArxiv { query, max_results } => {
                self.research
                    .search_arxiv(query, max_results.unwrap_or(settings.arxiv_max_results))
                    .await
            }
            ToolCall::Calculate { expression } => Ok(math::calculate(expression)?.to_string()),
            ToolCall::SolveEquation { equation, variable } => {
                Ok(math::solve(equation, variable)?.to_string())
            }
            ToolCall::ReverseText { text } => Ok(reverse_text(text)),
            ToolCall::SortItems { items, descending } => Ok(sort_items(items, *descending)),
        }
    }
}

fn reverse_text(text: &str) -> String {
    text.chars().rev().collect()
}

/// Case-insensitive sort, ties broken by the original spelling.
fn sort_items(items: &[String], descending: bool) -> String {
    let mut sorted: Vec<&str> = items.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    sorted.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    if descending {
        sorted.reverse();
    }
    sorted.join(", ")
}

fn function_tool(
    name: &str,
    description: &str,
    parameters: serde_json::Value,
) -> async_openai::types::ChatCompletionTool {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: name.to_string(),
            description: Some(description.to_string()),
            parameters: Some(parameters),
            strict: None,
        },
    }
}

/// Get OpenAI function/tool definitions for the agent.
pub fn tool_definitions() -> Vec<async_openai::types::ChatCompletionTool> {
    use serde_json::json;

    vec![
        function_tool(
            "web_search",
            "Search the web. Use this for current events and facts that are not on Wikipedia.",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The search query"},
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of results (default: 5)"
                    }
                },
                "required": ["query"]
            }),
        ),
        function_tool(
            "url_content",
            "Fetch a web page and return its readable text. \
            Use this to read a specific URL mentioned in the question or found by web_search.",
            json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "Absolute http(s) URL"}
                },
                "required": ["url"]
            }),
        ),
        function_tool(
            "search_wikipedia",
            "Search Wikipedia and return plain-text summaries of the best matching pages.",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The search query"},
                    "top_k": {
                        "type": "integer",
                        "description": "Number of pages to return (default: 3)"
                    },
                    "chars_max": {
                        "type": "integer",
                        "description": "Maximum characters per page summary (default: 2000)"
                    }
                },
                "required": ["query"]
            }),
        ),
        function_tool(
            "search_arxiv",
            "Search arXiv for academic papers. Returns titles, authors, dates and abstracts.",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The search query"},
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of papers (default: 3)"
                    }
                },
                "required": ["query"]
            }),
        ),
        function_tool(
            "calculate",
            "Evaluate an arithmetic or scientific expression, e.g. '2 + 2 * 3' or 'sqrt(16) + sin(pi/2)'.",
            json!({
                "type": "object",
                "properties": {
                    "expression": {"type": "string", "description": "The expression to evaluate"}
                },
                "required": ["expression"]
            }),
        ),
        function_tool(
            "solve_equation",
            "Find the real solutions of an equation in one variable, e.g. 'x**2 - 9 = 0'.",
            json!({
                "type": "object",
                "properties": {
                    "equation": {"type": "string", "description": "Equation, with or without '= rhs'"},
                    "variable": {"type": "string", "description": "Variable to solve for (default: x)"}
                },
                "required": ["equation"]
            }),
        ),
        function_tool(
            "reverse_text",
            "Reverse a string character by character. Use this on questions written backwards.",
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Text to reverse"}
                },
                "required": ["text"]
            }),
        ),
        function_tool(
            "sort_items",
            "Sort a list of strings alphabetically (case-insensitive) and return them comma separated.",
            json!({
                "type": "object",
                "properties": {
                    "items": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Items to sort"
                    },
                    "descending": {
                        "type": "boolean",
                        "description": "Sort Z to A instead of A to Z (default: false)"
                    }
                },
                "required": ["items"]
            }),
        ),
    ]
}

fn required_str(args: &serde_json::Value, key: &str) -> Result<String> {
    args[key]
        .as_str()
        .map(String::from)
        .ok_or_else(|| SvarError::Agent(format!("Missing '{}' argument", key)))
}

fn optional_usize(args: &serde_json::Value, key: &str) -> Option<usize> {
    args[key].as_u64().map(|n| n as usize)
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = if arguments.trim().is_empty() {
        serde_json::Value::Object(Default::default())
    } else {
        serde_json::from_str(arguments)
            .map_err(|e| SvarError::Agent(format!("Invalid tool arguments: {}", e)))?
    };

    match name {
        "web_search" => Ok(ToolCall::WebSearch {
            query: required_str(&args, "query")?,
            max_results: optional_usize(&args, "max_results"),
        }),
        "url_content" => Ok(ToolCall::UrlContent {
            url: required_str(&args, "url")?,
        }),
        "search_wikipedia" => Ok(ToolCall::SearchWikipedia {
            query: required_str(&args, "query")?,
            top_k: optional_usize(&args, "top_k"),
            chars_max: optional_usize(&args, "chars_max"),
        }),
        "search_arxiv" => Ok(ToolCall::SearchArxiv {
            query: required_str(&args, "query")?,
            max_results: optional_usize(&args, "max_results"),
        }),
        "calculate" => Ok(ToolCall::Calculate {
            expression: required_str(&args, "expression")?,
        }),
        "solve_equation" => Ok(ToolCall::SolveEquation {
            equation: required_str(&args, "equation")?,
            variable: args["variable"]
                .as_str()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or("x")
                .trim()
                .to_string(),
        }),
        "reverse_text" => Ok(ToolCall::ReverseText {
            text: required_str(&args, "text")?,
        }),
        "sort_items" => {
            let items = args["items"]
                .as_array()
                .ok_or_else(|| SvarError::Agent("Missing 'items' argument".to_string()))?
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            Ok(ToolCall::SortItems {
                items,
                descending: args["descending"].as_bool().unwrap_or(false),
            })
        }
        _ => Err(SvarError::ToolNotFound(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolSettings;

    fn context() -> ToolContext {
        let research = ResearchClient::with_http_client(reqwest::Client::new(), ToolSettings::default());
        ToolContext::new(Arc::new(research))
    }

    #[test]
    fn test_parse_web_search_tool() {
        let tool = parse_tool_call("web_search", r#"{"query": "Mercedes Sosa albums", "max_results": 3}"#).unwrap();
        assert_eq!(
            tool,
            ToolCall::WebSearch {
                query: "Mercedes Sosa albums".to_string(),
                max_results: Some(3),
            }
        );
    }

    #[test]
    fn test_parse_solve_equation_defaults_to_x() {
        let tool = parse_tool_call("solve_equation", r#"{"equation": "x**2 - 9 = 0"}"#).unwrap();
        match tool {
            ToolCall::SolveEquation { equation, variable } => {
                assert_eq!(equation, "x**2 - 9 = 0");
                assert_eq!(variable, "x");
            }
            _ => panic!("Expected SolveEquation tool"),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_tool_call("web_search", "{}"),
            Err(SvarError::Agent(_))
        ));
        assert!(matches!(
            parse_tool_call("web_search", "not json"),
            Err(SvarError::Agent(_))
        ));
        assert!(matches!(
            parse_tool_call("run_python", r#"{"code": "1"}"#),
            Err(SvarError::ToolNotFound(_))
        ));
    }

    #[test]
    fn test_definitions_match_parser() {
        let definitions = tool_definitions();
        assert_eq!(definitions.len(), 8);
        for def in definitions {
            let err = parse_tool_call(&def.function.name, "{}").err();
            assert!(
                !matches!(err, Some(SvarError::ToolNotFound(_))),
                "{} has no parser",
                def.function.name
            );
        }
    }

    #[tokio::test]
    async fn test_local_tools() {
        let ctx = context();

        let reversed = ctx
            .execute(&ToolCall::ReverseText {
                text: ".rewsna eht sa \"tfel\" drow".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(reversed, "word \"left\" as the answer.");

        let sorted = ctx
            .execute(&ToolCall::SortItems {
                items: vec!["broccoli".into(), "Celery".into(), "acorns".into(), " ".into()],
                descending: false,
            })
            .await
            .unwrap();
        assert_eq!(sorted, "acorns, broccoli, Celery");

        let calc = ctx
            .execute(&ToolCall::Calculate {
                expression: "2**10".to_string(),
            })
            .await
            .unwrap();
        assert!(calc.contains("Result: 1024"));

        let solved = ctx
            .execute(&ToolCall::SolveEquation {
                equation: "x**2 = 9".to_string(),
                variable: "x".to_string(),
            })
            .await
            .unwrap();
        assert!(solved.contains("x = [-3, 3]"));
    }

    #[tokio::test]
    async fn test_math_errors_propagate() {
        let ctx = context();
        let result = ctx
            .execute(&ToolCall::Calculate {
                expression: "1 / 0".to_string(),
            })
            .await;
        assert!(matches!(result, Err(SvarError::Math(_))));
    }

    #[test]
    fn test_sort_descending() {
        let items = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        assert_eq!(sort_items(&items, true), "c, b, a");
    }
}
