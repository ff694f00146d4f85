//! Spor - a console agent that can look things up
//!
//! Spor chats with a hosted chat-completion model (OpenAI or DeepSeek) and
//! lets the model consult one tool per turn before answering.
//!
//! # Overview
//!
//! Spor allows you to:
//! - Chat with a model that can search the web, read Wikipedia or search your documents
//! - Ask one-off questions without tools
//! - Answer questions from a folder of text documents
//! - Call a DashScope application
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `agent` - Transcript, tool trait and registry, and the two-round turn runner
//! - `tools` - Web search, Wikipedia and knowledge-base tools
//! - `config` - Configuration management
//! - `loader` - Reading documents from a folder
//! - `chunking` - Recursive text splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `rag` - Retrieval question answering
//! - `dashscope` - DashScope application client
//!
//! # Example
//!
//! ```rust,no_run
//! use spor::agent::{OpenAIChatBackend, ToolCallingAgent, ToolRegistry};
//! use spor::config::Settings;
//! use spor::tools::WikipediaTool;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let backend = OpenAIChatBackend::from_settings(&settings.chat, &settings.chat_credentials()?)?;
//!
//!     let mut tools = ToolRegistry::new();
//!     tools.register(Arc::new(WikipediaTool::new(&settings.wikipedia)?))?;
//!
//!     let mut agent = ToolCallingAgent::new(Arc::new(backend), tools, "You are helpful.");
//!     let reply = agent.submit("Who designed the Rust language?").await?;
//!     println!("{}", reply.content);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod dashscope;
pub mod embedding;
pub mod error;
pub mod loader;
pub mod openai;
pub mod rag;
pub mod tools;
pub mod vector_store;

pub use error::{Result, SporError};
