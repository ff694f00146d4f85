//! CLI command implementations.

mod app;
mod ask;
mod chat;
mod config;
mod qa;

pub use app::run_app;
pub use ask::run_ask;
pub use chat::{run_chat, ChatOptions};
pub use config::run_config;
pub use qa::run_qa;

use crate::config::{Prompts, Settings};
use crate::error::Result;

/// What a line typed at the console asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputCommand<'a> {
    /// `exit` or `quit`, any case.
    Exit,
    /// `clear`, any case.
    Clear,
    /// Nothing but whitespace.
    Empty,
    /// Anything else, trimmed.
    Message(&'a str),
}

impl<'a> InputCommand<'a> {
    pub(crate) fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            InputCommand::Empty
        } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            InputCommand::Exit
        } else if line.eq_ignore_ascii_case("clear") {
            InputCommand::Clear
        } else {
            InputCommand::Message(line)
        }
    }
}

/// Load prompts from the configured custom directory and variables.
pub(crate) fn load_prompts(settings: &Settings) -> Result<Prompts> {
    Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )
}
