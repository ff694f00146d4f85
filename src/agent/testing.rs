//! Scripted chat backend for unit tests.

use super::backend::ChatBackend;
use super::message::{AssistantReply, Message, ToolInvocation};
use super::tools::ToolSpec;
use crate::error::{Result, SporError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A request seen by the scripted backend.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<String>,
}

/// Backend that replays queued replies and records every request.
pub(crate) struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<AssistantReply>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedBackend {
    pub(crate) fn new(replies: Vec<Result<AssistantReply>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<AssistantReply> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages: messages.to_vec(),
            tools: tools.iter().map(|t| t.name.clone()).collect(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SporError::Endpoint("script exhausted".to_string())))
    }
}

pub(crate) fn text(content: &str) -> Result<AssistantReply> {
    Ok(AssistantReply {
        content: content.to_string(),
        tool_invocation: None,
    })
}

pub(crate) fn call(name: &str, arguments: &str) -> Result<AssistantReply> {
    Ok(AssistantReply {
        content: String::new(),
        tool_invocation: Some(ToolInvocation {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }),
    })
}
