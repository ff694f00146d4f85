//! Tool-calling agent.
//!
//! Owns the conversation transcript and a registry of tools, and drives the
//! two-round function-calling exchange with a chat-completion endpoint.

mod backend;
mod message;
mod runner;
mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{ChatBackend, OpenAIChatBackend};
pub use message::{AssistantReply, Checkpoint, Message, Role, ToolInvocation, Transcript};
pub use runner::{ToolCallingAgent, ToolExchange, TurnReply};
pub use tools::{
    ParamKind, ParamSpec, SearchHit, Tool, ToolArguments, ToolRegistry, ToolResult, ToolSpec,
};
