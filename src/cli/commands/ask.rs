//! Ask command implementation.

use super::load_prompts;
use crate::agent::{OpenAIChatBackend, ToolCallingAgent, ToolRegistry};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{ChatProvider, Settings};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Run the ask command: one question, no tools.
pub async fn run_ask(
    question: &str,
    provider: Option<ChatProvider>,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(provider) = provider {
        settings.use_provider(provider);
    }
    if let Some(model) = model {
        settings.chat.model = model;
    }

    if let Err(e) = preflight::check(&settings, Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let backend = Arc::new(OpenAIChatBackend::from_settings(
        &settings.chat,
        &settings.chat_credentials()?,
    )?);
    let prompts = load_prompts(&settings)?;
    let system_prompt = prompts.render_with_custom(&prompts.agent.system, &HashMap::new());
    let mut agent = ToolCallingAgent::new(backend, ToolRegistry::new(), &system_prompt);

    let spinner = Output::spinner(&format!("Asking {}...", settings.chat.model));

    match agent.submit(question).await {
        Ok(reply) => {
            spinner.finish_and_clear();
            println!("\n{}\n", reply.content);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to get an answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
