//! CLI module for Spor.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::ChatProvider;
use clap::{Parser, Subcommand};

/// Spor - a console assistant that can look things up
///
/// Chat with a hosted model that may call a web search, a Wikipedia lookup
/// or your own documents before it answers.
#[derive(Parser, Debug)]
#[command(name = "spor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session with tool calling
    Chat {
        /// Chat provider preset (openai, deepseek)
        #[arg(short, long)]
        provider: Option<ChatProvider>,

        /// Model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Folder of .txt/.md documents to index for the knowledge_base tool
        #[arg(short, long)]
        docs: Option<String>,

        /// Do not offer the web search tool
        #[arg(long)]
        no_search: bool,

        /// Do not offer the Wikipedia tool
        #[arg(long)]
        no_wiki: bool,
    },

    /// Ask a single question without tools
    Ask {
        /// The question to ask
        question: String,

        /// Chat provider preset (openai, deepseek)
        #[arg(short, long)]
        provider: Option<ChatProvider>,

        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Answer questions from a folder of documents
    Qa {
        /// Folder of .txt/.md documents
        #[arg(short, long)]
        docs: String,

        /// Number of chunks retrieved per question
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Call a DashScope application
    App {
        /// Prompt sent to the application
        prompt: String,

        /// Application ID (overrides dashscope.app_id)
        #[arg(long)]
        app_id: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_flags() {
        let cli = Cli::try_parse_from([
            "spor", "-vv", "chat", "--provider", "deepseek", "--no-wiki", "--docs", "notes",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Chat {
                provider,
                docs,
                no_search,
                no_wiki,
                ..
            } => {
                assert_eq!(provider, Some(ChatProvider::DeepSeek));
                assert_eq!(docs.as_deref(), Some("notes"));
                assert!(!no_search);
                assert!(no_wiki);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(Cli::try_parse_from(["spor", "ask", "hi", "--provider", "other"]).is_err());
    }

    #[test]
    fn test_qa_requires_docs() {
        assert!(Cli::try_parse_from(["spor", "qa"]).is_err());
        assert!(Cli::try_parse_from(["spor", "qa", "--docs", "d", "-k", "3"]).is_ok());
    }
}
