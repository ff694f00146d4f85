//! Interactive chat command with tool calling support.

use super::{load_prompts, InputCommand};
use crate::agent::{OpenAIChatBackend, ToolCallingAgent, ToolRegistry};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{ChatProvider, Settings};
use crate::error::Result;
use crate::tools::{KnowledgeBaseTool, WebSearchTool, WikipediaTool};
use console::style;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;

/// Flags for `spor chat`.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub provider: Option<ChatProvider>,
    pub model: Option<String>,
    pub docs: Option<String>,
    pub no_search: bool,
    pub no_wiki: bool,
}

/// Run the interactive chat command.
pub async fn run_chat(options: ChatOptions, mut settings: Settings) -> anyhow::Result<()> {
    if let Some(provider) = options.provider {
        settings.use_provider(provider);
    }
    if let Some(model) = &options.model {
        settings.chat.model = model.clone();
    }

    preflight::check(
        &settings,
        Operation::Chat {
            search: !options.no_search,
            docs: options.docs.as_deref(),
        },
    )?;

    let backend = Arc::new(OpenAIChatBackend::from_settings(
        &settings.chat,
        &settings.chat_credentials()?,
    )?);

    let mut tools = ToolRegistry::new();
    if !options.no_search {
        tools.register(Arc::new(WebSearchTool::new(
            &settings.search,
            &settings.search_credentials()?,
        )?))?;
    }
    if !options.no_wiki {
        tools.register(Arc::new(WikipediaTool::new(&settings.wikipedia)?))?;
    }
    if let Some(docs) = &options.docs {
        let engine = super::qa::build_engine(&settings, backend.clone(), docs).await?;
        tools.register(Arc::new(KnowledgeBaseTool::new(engine.context_builder())))?;
    }

    let prompts = load_prompts(&settings)?;
    let system_prompt = prompts.render_with_custom(&prompts.agent.system, &HashMap::new());
    info!(
        "Chat with {} ({}) and tools: {}",
        settings.chat.model,
        settings.chat.provider,
        tools.names().join(", ")
    );

    let mut agent = ToolCallingAgent::new(backend, tools, &system_prompt);

    println!("\n{}", style("Spor Chat").bold().cyan());
    Output::kv("model", &settings.chat.model);
    Output::kv("tools", &agent.tools().names().join(", "));
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    chat_loop(&mut agent, io::stdin().lock(), &mut io::stdout()).await?;
    Ok(())
}

/// Read lines until `exit`/`quit` or end of input, one turn per line.
pub(crate) async fn chat_loop<R: BufRead, W: Write>(
    agent: &mut ToolCallingAgent,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    loop {
        write!(out, "{} ", style("You:").green().bold())?;
        out.flush()?;

        let mut buf = Vec::new();
        if input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(out)?;
            break;
        }
        let line = String::from_utf8_lossy(&buf);

        match InputCommand::parse(&line) {
            InputCommand::Empty => continue,
            InputCommand::Exit => {
                writeln!(out, "Goodbye!")?;
                break;
            }
            InputCommand::Clear => {
                agent.clear();
                writeln!(out, "Conversation history cleared.")?;
            }
            InputCommand::Message(text) => {
                let spinner = Output::spinner("Thinking...");
                let outcome = agent.submit(text).await;
                spinner.finish_and_clear();

                match outcome {
                    Ok(reply) => {
                        if let Some(exchange) = &reply.tool {
                            writeln!(out, "{}", style(format!("  [{}]", exchange)).dim())?;
                        }
                        writeln!(out, "\n{} {}\n", style("Spor:").cyan().bold(), reply.content)?;
                    }
                    Err(e) => {
                        writeln!(out, "{} {}", style("Error:").red().bold(), e)?;
                        if !e.is_turn_level() {
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{call, text, ScriptedBackend};
    use crate::error::SporError;

    fn agent(backend: Arc<ScriptedBackend>) -> ToolCallingAgent {
        ToolCallingAgent::new(backend, ToolRegistry::new(), "You are helpful.")
    }

    #[tokio::test]
    async fn test_exit_sentinel_stops_before_next_turn() {
        let backend = ScriptedBackend::new(vec![text("Hi there!"), text("never used")]);
        let mut agent = agent(backend.clone());
        let mut out = Vec::new();

        chat_loop(&mut agent, "hello\n\nEXIT\nsecond\n".as_bytes(), &mut out)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Hi there!"));
        assert!(out.contains("Goodbye!"));
        assert!(!out.contains("never used"));
        assert_eq!(backend.requests().len(), 1);
        assert_eq!(agent.transcript().len(), 3);
    }

    #[tokio::test]
    async fn test_errors_keep_session_alive() {
        let backend = ScriptedBackend::new(vec![call("calculator", "{}"), text("Fine.")]);
        let mut agent = agent(backend.clone());
        let mut out = Vec::new();

        chat_loop(&mut agent, "what is 2+2\nthanks\nquit\n".as_bytes(), &mut out)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Unknown tool 'calculator'"));
        assert!(out.contains("Fine."));
        assert_eq!(backend.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_config_error_ends_session() {
        let backend = ScriptedBackend::new(vec![
            Err(SporError::Config("OPENAI_API_KEY not set".to_string())),
            text("never used"),
        ]);
        let mut agent = agent(backend.clone());
        let mut out = Vec::new();

        let err = chat_loop(&mut agent, "hello\nagain\n".as_bytes(), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, SporError::Config(_)));
        assert_eq!(backend.requests().len(), 1);
        assert!(String::from_utf8(out).unwrap().contains("OPENAI_API_KEY not set"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_still_a_turn() {
        let backend = ScriptedBackend::new(vec![text("Got it."), text("Second.")]);
        let mut agent = agent(backend.clone());
        let mut out = Vec::new();
        let input: &[u8] = b"caf\xe9 menu\nnext\nexit\n";

        chat_loop(&mut agent, input, &mut out).await.unwrap();

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].messages[1].content(), "caf\u{FFFD} menu");
    }

    #[tokio::test]
    async fn test_clear_resets_transcript_and_eof_ends() {
        let backend = ScriptedBackend::new(vec![text("One.")]);
        let mut agent = agent(backend);
        let mut out = Vec::new();

        chat_loop(&mut agent, "first\nclear\n".as_bytes(), &mut out)
            .await
            .unwrap();

        assert_eq!(agent.transcript().len(), 1);
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("Conversation history cleared."));
    }
}
