//! Agent runner with tool calling loop.

use super::answer::extract_final_answer;
use super::model::{ChatModel, ModelTurn};
use super::tools::{parse_tool_call, tool_definitions, ToolContext};
use crate::config::Prompts;
use crate::content::{ContentPart, QuestionContent};
use crate::error::{Result, SvarError};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
    ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
    ChatCompletionTool, ImageDetail, ImageUrl,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Upper bound for a single retry delay.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Agent that answers a question by calling tools until it can commit to an answer.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: ToolContext,
    prompts: Prompts,
    definitions: Vec<ChatCompletionTool>,
    max_iterations: usize,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl Agent {
    /// Create a new agent with the given model, tool context and prompts.
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolContext, prompts: Prompts) -> Self {
        Self {
            model,
            tools,
            prompts,
            definitions: tool_definitions(),
            max_iterations: 6,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Set maximum tool-calling iterations before the agent must answer.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set how many times a model call is attempted before giving up.
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Set the first retry delay; later delays double up to ten seconds.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Name of the underlying model.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Run the agent on a prepared question.
    #[instrument(skip(self, content), fields(task_id = %content.task_id))]
    pub async fn run(&self, content: &QuestionContent) -> Result<AgentResponse> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.agent_system())
                .build()
                .map_err(|e| SvarError::Agent(e.to_string()))?
                .into(),
            user_message(content)?,
        ];

        let mut tools_enabled = true;
        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        while iterations < self.max_iterations {
            debug!("Agent iteration {}", iterations + 1);

            let tools = tools_enabled.then_some(self.definitions.as_slice());
            let turn = match self.complete_with_retry(&messages, tools).await {
                Ok(turn) => turn,
                Err(SvarError::ToolUseUnsupported(msg)) if tools_enabled => {
                    warn!("Model rejected tool use, continuing without tools: {}", msg);
                    tools_enabled = false;
                    continue;
                }
                Err(e) => return Err(e),
            };
            iterations += 1;

            if turn.tool_calls.is_empty() {
                return build_response(turn.content, tool_calls_made, iterations, false);
            }

            let mut assistant = ChatCompletionRequestAssistantMessageArgs::default();
            assistant.tool_calls(turn.tool_calls.clone());
            if let Some(text) = turn.content.filter(|t| !t.trim().is_empty()) {
                assistant.content(text);
            }
            messages.push(
                assistant
                    .build()
                    .map_err(|e| SvarError::Agent(e.to_string()))?
                    .into(),
            );

            for tool_call in &turn.tool_calls {
                let record = self.execute_tool_call(tool_call).await;

                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(record.result.clone())
                    .build()
                    .map_err(|e| SvarError::Agent(e.to_string()))?;
                messages.push(tool_msg.into());

                tool_calls_made.push(record);
            }
        }

        info!(
            "Iteration budget of {} spent, asking for a final answer",
            self.max_iterations
        );
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(self.prompts.agent_finalize())
                .build()
                .map_err(|e| SvarError::Agent(e.to_string()))?
                .into(),
        );

        let turn = self.complete_with_retry(&messages, None).await?;
        build_response(turn.content, tool_calls_made, iterations + 1, true)
    }

    /// Call the model, retrying transient failures with exponential backoff.
    async fn complete_with_retry(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: Option<&[ChatCompletionTool]>,
    ) -> Result<ModelTurn> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.model.complete(messages, tools).await {
                Ok(turn) => return Ok(turn),
                Err(e) if e.is_retryable() && attempt < self.retry_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "Model call failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt, self.retry_attempts, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> ToolCallRecord {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent calling tool: {} with args: {}", name, arguments);

        let result = match parse_tool_call(name, arguments) {
            Ok(tool) => match self.tools.execute(&tool).await {
                Ok(output) => output,
                Err(e) => format!("Tool error: {}", e),
            },
            Err(e) => format!("Failed to parse tool call: {}", e),
        };

        ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
        }
    }
}

fn user_message(content: &QuestionContent) -> Result<ChatCompletionRequestMessage> {
    let mut builder = ChatCompletionRequestUserMessageArgs::default();

    if content.has_image() {
        let parts = content
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => ChatCompletionRequestUserMessageContentPart::Text(
                    ChatCompletionRequestMessageContentPartText { text: text.clone() },
                ),
                ContentPart::ImageDataUrl(url) => {
                    ChatCompletionRequestUserMessageContentPart::ImageUrl(
                        ChatCompletionRequestMessageContentPartImage {
                            image_url: ImageUrl {
                                url: url.clone(),
                                detail: Some(ImageDetail::Auto),
                            },
                        },
                    )
                }
            })
            .collect();
        builder.content(ChatCompletionRequestUserMessageContent::Array(parts));
    } else {
        builder.content(content.text());
    }

    Ok(builder
        .build()
        .map_err(|e| SvarError::Agent(e.to_string()))?
        .into())
}

fn build_response(
    content: Option<String>,
    tool_calls: Vec<ToolCallRecord>,
    iterations: usize,
    forced_final: bool,
) -> Result<AgentResponse> {
    let raw = content.unwrap_or_default();
    if raw.trim().is_empty() {
        return Err(SvarError::Agent("Model returned an empty reply".to_string()));
    }

    Ok(AgentResponse {
        answer: extract_final_answer(&raw),
        raw,
        tool_calls,
        iterations,
        forced_final,
    })
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The normalised answer.
    pub answer: String,
    /// The model's final reply, unmodified.
    pub raw: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of model turns used.
    pub iterations: usize,
    /// Whether the answer was forced after the iteration budget ran out.
    pub forced_final: bool,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
