//! Agent system for answering questions with tool calling.
//!
//! The agent plans in natural language, calls research and math tools through
//! OpenAI-style function calling, and finishes with a `FINAL ANSWER:` line that
//! is normalised for exact-match scoring.

mod answer;
mod model;
mod runner;
mod tools;

pub use answer::extract_final_answer;
pub use model::{ChatModel, ModelTurn, OpenAiChat};
pub use runner::{Agent, AgentResponse, ToolCallRecord};
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext};
