//! Conversation messages and the transcript replayed to the chat endpoint.

use serde::{Deserialize, Serialize};

/// Speaker of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A request from the model to run a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Provider-assigned call id, echoed back on the tool result.
    pub id: String,
    /// Requested tool name.
    pub name: String,
    /// Raw JSON argument payload as emitted by the model.
    pub arguments: String,
}

/// A single message in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_invocation: Option<ToolInvocation>,
    },
    Tool {
        call_id: String,
        name: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_invocation: None,
        }
    }

    /// Tool result answering `invocation`.
    pub fn tool_result(invocation: &ToolInvocation, content: impl Into<String>) -> Self {
        Message::Tool {
            call_id: invocation.id.clone(),
            name: invocation.name.clone(),
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::System { .. } => Role::System,
            Message::User { .. } => Role::User,
            Message::Assistant { .. } => Role::Assistant,
            Message::Tool { .. } => Role::Tool,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content, .. }
            | Message::Tool { content, .. } => content,
        }
    }

    pub fn tool_invocation(&self) -> Option<&ToolInvocation> {
        match self {
            Message::Assistant {
                tool_invocation, ..
            } => tool_invocation.as_ref(),
            _ => None,
        }
    }
}

/// An assistant message as returned by one chat-endpoint round.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub content: String,
    pub tool_invocation: Option<ToolInvocation>,
}

impl From<AssistantReply> for Message {
    fn from(reply: AssistantReply) -> Self {
        Message::Assistant {
            content: reply.content,
            tool_invocation: reply.tool_invocation,
        }
    }
}

/// Length marker used to undo a failed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Ordered message history, seeded with a system message.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.messages.len())
    }

    /// Drop everything appended since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.messages.truncate(checkpoint.0);
    }

    /// Reset to the system message.
    pub fn clear(&mut self) {
        self.messages.truncate(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_rollback() {
        let mut transcript = Transcript::new("sys");
        transcript.push(Message::user("one"));
        let checkpoint = transcript.checkpoint();
        transcript.push(Message::user("two"));
        transcript.push(Message::assistant("reply"));
        assert_eq!(transcript.len(), 4);

        transcript.rollback(checkpoint);
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last().map(Message::content), Some("one"));
    }

    #[test]
    fn test_clear_keeps_system() {
        let mut transcript = Transcript::new("sys");
        transcript.push(Message::user("hi"));
        transcript.clear();
        assert_eq!(transcript.messages(), &[Message::system("sys")]);
    }

    #[test]
    fn test_tool_result_pairs_with_invocation() {
        let invocation = ToolInvocation {
            id: "call_1".to_string(),
            name: "search_tool".to_string(),
            arguments: r#"{"query":"rust"}"#.to_string(),
        };
        let msg = Message::tool_result(&invocation, "[]");
        assert_eq!(msg.role(), Role::Tool);
        match msg {
            Message::Tool { call_id, name, .. } => {
                assert_eq!(call_id, "call_1");
                assert_eq!(name, "search_tool");
            }
            _ => panic!("Expected tool message"),
        }
    }

    #[test]
    fn test_message_serializes_with_role_tag() {
        let json = serde_json::to_value(Message::user("hello")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
    }
}
