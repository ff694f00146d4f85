//! The tool-calling agent: one user turn, at most one tool call.

use super::backend::ChatBackend;
use super::message::{Message, Transcript};
use super::tools::{Tool, ToolArguments, ToolRegistry, ToolResult};
use crate::error::{Result, SporError};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Agent that answers user turns, optionally consulting one tool per turn.
///
/// Round 1 offers the registry to the model. If the model asks for a tool,
/// the tool runs and round 2 asks for the final answer with no tools offered.
pub struct ToolCallingAgent {
    backend: Arc<dyn ChatBackend>,
    tools: ToolRegistry,
    transcript: Transcript,
}

impl ToolCallingAgent {
    /// Create an agent whose transcript starts with `system_prompt`.
    pub fn new(backend: Arc<dyn ChatBackend>, tools: ToolRegistry, system_prompt: &str) -> Self {
        Self {
            backend,
            tools,
            transcript: Transcript::new(system_prompt),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Clear conversation history (keeps system prompt).
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Run one turn.
    ///
    /// The transcript grows by 2 messages for a direct reply and by 4 when a
    /// tool ran. An unknown tool leaves the user message and the request in
    /// place and returns [`SporError::UnknownTool`]. Any other error rolls the
    /// transcript back to where it was before the turn.
    #[instrument(skip(self, user_text), fields(transcript = self.transcript.len()))]
    pub async fn submit(&mut self, user_text: &str) -> Result<TurnReply> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(SporError::InvalidInput("Message is empty".to_string()));
        }

        let checkpoint = self.transcript.checkpoint();
        let outcome = self.run_turn(user_text).await;
        if let Err(ref e) = outcome {
            if !matches!(e, SporError::UnknownTool(_)) {
                debug!("Rolling back failed turn: {}", e);
                self.transcript.rollback(checkpoint);
            }
        }
        outcome
    }

    async fn run_turn(&mut self, user_text: &str) -> Result<TurnReply> {
        self.transcript.push(Message::user(user_text));

        let specs = self.tools.specs();
        let reply = self
            .backend
            .complete(self.transcript.messages(), &specs)
            .await?;

        let Some(invocation) = reply.tool_invocation.clone() else {
            let content = reply.content.clone();
            self.transcript.push(reply.into());
            return Ok(TurnReply {
                content,
                tool: None,
            });
        };

        let Some(tool) = self.tools.get(&invocation.name).cloned() else {
            warn!("Model requested unknown tool: {}", invocation.name);
            self.transcript.push(reply.into());
            return Err(SporError::UnknownTool(invocation.name));
        };

        let args = tool.spec().parse_arguments(&invocation.arguments)?;

        info!("Agent calling tool: {} with args: {}", invocation.name, invocation.arguments);
        let result = run_tool(tool.as_ref(), &invocation.name, &args).await;
        let content = result.to_content()?;

        self.transcript.push(reply.into());
        self.transcript
            .push(Message::tool_result(&invocation, content.as_str()));

        // No tools in round 2: a turn never chains a second call.
        let final_reply = self
            .backend
            .complete(self.transcript.messages(), &[])
            .await?;
        if let Some(extra) = &final_reply.tool_invocation {
            warn!("Ignoring tool request '{}' in the answer round", extra.name);
        }

        let answer = final_reply.content;
        self.transcript.push(Message::assistant(answer.as_str()));

        Ok(TurnReply {
            content: answer,
            tool: Some(ToolExchange {
                name: invocation.name,
                arguments: invocation.arguments,
                result: content,
            }),
        })
    }
}

/// Invoke a tool, replacing failures and empty output with its fallback.
async fn run_tool(tool: &dyn Tool, name: &str, args: &ToolArguments) -> ToolResult {
    match tool.invoke(args).await {
        Ok(result) if !result.is_empty() => result,
        Ok(_) => {
            debug!("Tool {} returned nothing", name);
            tool.fallback(args)
        }
        Err(e) => {
            let error = SporError::ToolExecution {
                tool: name.to_string(),
                reason: e.to_string(),
            };
            warn!("{}", error);
            tool.fallback(args)
        }
    }
}

/// Final answer of a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    /// Text shown to the user.
    pub content: String,
    /// The tool exchange, if a tool ran.
    pub tool: Option<ToolExchange>,
}

/// Record of the tool call made during a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolExchange {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Serialized result handed to the model.
    pub result: String,
}

impl std::fmt::Display for ToolExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::Role;
    use crate::agent::testing::{call, text, ScriptedBackend};
    use crate::agent::tools::{ParamKind, ParamSpec, SearchHit, ToolSpec};
    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok};

    struct FakeSearch {
        spec: ToolSpec,
        hits: Result<Vec<SearchHit>>,
    }

    impl FakeSearch {
        fn returning(hits: Result<Vec<SearchHit>>) -> Arc<Self> {
            Arc::new(Self {
                spec: ToolSpec::new(
                    "search_tool",
                    "Search the web",
                    vec![ParamSpec::required("query", ParamKind::String, "Search query")],
                ),
                hits,
            })
        }
    }

    #[async_trait]
    impl Tool for FakeSearch {
        fn spec(&self) -> &ToolSpec {
            &self.spec
        }

        async fn invoke(&self, _args: &ToolArguments) -> Result<ToolResult> {
            match &self.hits {
                Ok(hits) => Ok(ToolResult::Hits(hits.clone())),
                Err(e) => Err(SporError::InvalidInput(e.to_string())),
            }
        }

        fn fallback(&self, _args: &ToolArguments) -> ToolResult {
            ToolResult::Hits(Vec::new())
        }
    }

    fn three_hits() -> Vec<SearchHit> {
        (1..=3)
            .map(|i| SearchHit {
                title: format!("Story {}", i),
                link: format!("https://news.example/{}", i),
                snippet: format!("Snippet {}", i),
            })
            .collect()
    }

    fn agent_with(backend: Arc<ScriptedBackend>, hits: Result<Vec<SearchHit>>) -> ToolCallingAgent {
        let mut tools = ToolRegistry::new();
        tools.register(FakeSearch::returning(hits)).unwrap();
        ToolCallingAgent::new(backend, tools, "You are a helpful assistant.")
    }

    fn roles(agent: &ToolCallingAgent) -> Vec<Role> {
        agent.transcript().messages().iter().map(Message::role).collect()
    }

    #[tokio::test]
    async fn test_direct_reply_appends_two_messages() {
        let backend = ScriptedBackend::new(vec![text("Paris.")]);
        let mut agent = agent_with(backend.clone(), Ok(three_hits()));

        let reply = assert_ok!(agent.submit("What is the capital of France?").await);

        assert_eq!(reply.content, "Paris.");
        assert!(reply.tool.is_none());
        assert_eq!(agent.transcript().len(), 3);
        assert_eq!(roles(&agent), vec![Role::System, Role::User, Role::Assistant]);

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tools, vec!["search_tool"]);
    }

    #[tokio::test]
    async fn test_tool_path_appends_four_messages() {
        let backend = ScriptedBackend::new(vec![
            call("search_tool", r#"{"query": "latest news on X"}"#),
            text("Here is the latest on X."),
        ]);
        let mut agent = agent_with(backend.clone(), Ok(three_hits()));

        let reply = assert_ok!(agent.submit("latest news on X").await);

        assert_eq!(reply.content, "Here is the latest on X.");
        let exchange = reply.tool.unwrap();
        assert_eq!(exchange.name, "search_tool");
        let hits: Vec<SearchHit> = serde_json::from_str(&exchange.result).unwrap();
        assert_eq!(hits.len(), 3);

        assert_eq!(agent.transcript().len(), 5);
        assert_eq!(
            roles(&agent)[1..],
            [Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        assert!(agent.transcript().messages()[2].tool_invocation().is_some());

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools, vec!["search_tool"]);
        assert!(requests[1].tools.is_empty());
        assert_eq!(requests[1].messages.len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_tool_ends_turn_without_second_round() {
        let backend = ScriptedBackend::new(vec![call("frobnicate", "{}")]);
        let mut agent = agent_with(backend.clone(), Ok(three_hits()));

        let err = assert_err!(agent.submit("do the thing").await);

        assert_eq!(err.to_string(), "Unknown tool 'frobnicate'");
        assert_eq!(backend.requests().len(), 1);
        assert_eq!(agent.transcript().len(), 3);
        assert_eq!(roles(&agent)[1..], [Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_malformed_arguments_roll_back() {
        let backend = ScriptedBackend::new(vec![call("search_tool", r#"{"query": "#)]);
        let mut agent = agent_with(backend.clone(), Ok(three_hits()));

        let err = assert_err!(agent.submit("latest news").await);

        assert!(matches!(err, SporError::ToolInvocationParse { .. }));
        assert_eq!(agent.transcript().len(), 1);
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_tool_still_reaches_round_two() {
        let backend = ScriptedBackend::new(vec![
            call("search_tool", r#"{"query": "anything"}"#),
            text("I could not find anything."),
        ]);
        let mut agent = agent_with(
            backend.clone(),
            Err(SporError::InvalidInput("connection refused".to_string())),
        );

        let reply = assert_ok!(agent.submit("anything").await);

        assert_eq!(reply.content, "I could not find anything.");
        assert_eq!(reply.tool.unwrap().result, "[]");
        assert_eq!(agent.transcript().len(), 5);
        assert_eq!(agent.transcript().messages()[3].content(), "[]");
    }

    #[tokio::test]
    async fn test_zero_results_serialize_as_empty_list() {
        let backend = ScriptedBackend::new(vec![
            call("search_tool", r#"{"query": "nothing"}"#),
            text("No results."),
        ]);
        let mut agent = agent_with(backend, Ok(Vec::new()));

        let reply = assert_ok!(agent.submit("nothing").await);
        assert_eq!(reply.tool.unwrap().result, "[]");
    }

    #[tokio::test]
    async fn test_endpoint_failure_leaves_transcript_unchanged() {
        let backend = ScriptedBackend::new(vec![
            Err(SporError::Endpoint("connection reset".to_string())),
            text("Paris."),
        ]);
        let mut agent = agent_with(backend.clone(), Ok(three_hits()));

        let err = assert_err!(agent.submit("Capital of France?").await);
        assert!(matches!(err, SporError::Endpoint(_)));
        assert_eq!(agent.transcript().len(), 1);

        let reply = assert_ok!(agent.submit("Capital of France?").await);
        assert_eq!(reply.content, "Paris.");
        assert_eq!(agent.transcript().len(), 3);
    }

    #[tokio::test]
    async fn test_round_two_failure_rolls_back_whole_turn() {
        let backend = ScriptedBackend::new(vec![call("search_tool", r#"{"query": "x"}"#)]);
        let mut agent = agent_with(backend.clone(), Ok(three_hits()));

        assert_err!(agent.submit("x").await);
        assert_eq!(backend.requests().len(), 2);
        assert_eq!(agent.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_without_call() {
        let backend = ScriptedBackend::new(vec![]);
        let mut agent = agent_with(backend.clone(), Ok(three_hits()));

        let err = assert_err!(agent.submit("   ").await);
        assert!(matches!(err, SporError::InvalidInput(_)));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_transcript_is_replayed_across_turns() {
        let backend = ScriptedBackend::new(vec![text("Hi!"), text("You said hello.")]);
        let mut agent = agent_with(backend.clone(), Ok(three_hits()));

        assert_ok!(agent.submit("hello").await);
        assert_ok!(agent.submit("what did I say?").await);

        let requests = backend.requests();
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[1].messages[1], Message::user("hello"));
        assert_eq!(requests[1].messages[2], Message::assistant("Hi!"));
    }

    #[test]
    fn test_tool_exchange_display() {
        let exchange = ToolExchange {
            name: "search_tool".to_string(),
            arguments: r#"{"query": "test"}"#.to_string(),
            result: "[]".to_string(),
        };
        assert_eq!(format!("{}", exchange), r#"search_tool({"query": "test"})"#);
    }
}
