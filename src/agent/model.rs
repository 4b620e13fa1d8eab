//! Chat model abstraction used by the agent loop.

use crate::config::LlmSettings;
use crate::error::{Result, SvarError};
use crate::openai::map_api_error;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestMessage, ChatCompletionTool,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::debug;

/// One reply from the model.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ChatCompletionMessageToolCall>,
}

/// A chat model that can optionally call tools.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logs and health output.
    fn name(&self) -> &str;

    /// Run one completion over the conversation so far. `tools` is `None` when tool use is off.
    async fn complete(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: Option<&[ChatCompletionTool]>,
    ) -> Result<ModelTurn>;
}

/// Chat completions against OpenAI or any compatible endpoint.
pub struct OpenAiChat {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl OpenAiChat {
    pub fn new(client: Client<OpenAIConfig>, settings: &LlmSettings) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: Option<&[ChatCompletionTool]>,
    ) -> Result<ModelTurn> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(messages.to_vec())
            .temperature(self.temperature)
            .max_completion_tokens(self.max_output_tokens);

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            builder.tools(tools.to_vec());
        }

        let request = builder
            .build()
            .map_err(|e| SvarError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_api_error)?;

        if let Some(usage) = &response.usage {
            debug!(
                "Tokens used: {} prompt, {} completion",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SvarError::Agent("No response from model".to_string()))?;

        Ok(ModelTurn {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }
}
