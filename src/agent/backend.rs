//! Chat-completion backends.

use super::message::{AssistantReply, Message, ToolInvocation};
use super::tools::ToolSpec;
use crate::config::{ChatSettings, Credentials};
use crate::error::{Result, SporError};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// One round against a chat-completion endpoint.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the transcript and return the assistant's reply.
    ///
    /// An empty `tools` slice means no tools are offered.
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<AssistantReply>;
}

/// Backend for OpenAI-compatible chat completions (OpenAI, DeepSeek).
pub struct OpenAIChatBackend {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIChatBackend {
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    /// Build a backend from chat settings and resolved credentials.
    pub fn from_settings(settings: &ChatSettings, credentials: &Credentials) -> Result<Self> {
        let client = create_client(credentials, Duration::from_secs(settings.timeout_secs))?;
        Ok(Self::new(client, &settings.model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatBackend for OpenAIChatBackend {
    #[instrument(skip(self, messages, tools), fields(model = %self.model, messages = messages.len(), tools = tools.len()))]
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<AssistantReply> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(to_request_messages(messages)?);
        if !tools.is_empty() {
            builder.tools(tools.iter().map(to_chat_tool).collect::<Vec<_>>());
        }
        let request = builder
            .build()
            .map_err(|e| SporError::Endpoint(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SporError::Endpoint(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SporError::Endpoint("No response from model".to_string()))?;

        let mut tool_calls = choice.message.tool_calls.unwrap_or_default().into_iter();
        let tool_invocation = tool_calls.next().map(|call| ToolInvocation {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        });
        let ignored = tool_calls.count();
        if ignored > 0 {
            warn!("Model requested {} extra tool call(s); only the first is run", ignored);
        }

        debug!(tool = ?tool_invocation.as_ref().map(|t| &t.name), "Received assistant reply");

        Ok(AssistantReply {
            content: choice.message.content.unwrap_or_default(),
            tool_invocation,
        })
    }
}

fn to_chat_tool(spec: &ToolSpec) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parameters: Some(spec.json_schema()),
            strict: None,
        },
    }
}

/// Convert the transcript into request messages.
///
/// A tool request without a following result (the model named an unknown
/// tool) is replayed as plain assistant text so the provider accepts it.
fn to_request_messages(messages: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>> {
    let build_error = |e: async_openai::error::OpenAIError| SporError::Endpoint(e.to_string());

    let mut converted = Vec::with_capacity(messages.len());
    for (i, message) in messages.iter().enumerate() {
        let request_message: ChatCompletionRequestMessage = match message {
            Message::System { content } => ChatCompletionRequestSystemMessageArgs::default()
                .content(content.as_str())
                .build()
                .map_err(build_error)?
                .into(),
            Message::User { content } => ChatCompletionRequestUserMessageArgs::default()
                .content(content.as_str())
                .build()
                .map_err(build_error)?
                .into(),
            Message::Assistant {
                content,
                tool_invocation: Some(invocation),
            } if is_answered(messages, i, invocation) => {
                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                args.tool_calls(vec![ChatCompletionMessageToolCall {
                    id: invocation.id.clone(),
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionCall {
                        name: invocation.name.clone(),
                        arguments: invocation.arguments.clone(),
                    },
                }]);
                if !content.is_empty() {
                    args.content(content.as_str());
                }
                args.build().map_err(build_error)?.into()
            }
            Message::Assistant {
                content,
                tool_invocation,
            } => {
                let text = match tool_invocation {
                    Some(invocation) if content.is_empty() => {
                        format!("(requested unknown tool '{}')", invocation.name)
                    }
                    _ => content.clone(),
                };
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(text)
                    .build()
                    .map_err(build_error)?
                    .into()
            }
            Message::Tool {
                call_id, content, ..
            } => ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(call_id.as_str())
                .content(content.as_str())
                .build()
                .map_err(build_error)?
                .into(),
        };
        converted.push(request_message);
    }
    Ok(converted)
}

fn is_answered(messages: &[Message], index: usize, invocation: &ToolInvocation) -> bool {
    matches!(
        messages.get(index + 1),
        Some(Message::Tool { call_id, .. }) if *call_id == invocation.id
    )
}
