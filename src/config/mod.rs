//! Configuration module for Spor.
//!
//! Handles loading and managing application settings, credentials and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts, QaPrompts};
pub use settings::{
    api_key_from_env, ChatProvider, ChatSettings, Credentials, DashScopeSettings,
    EmbeddingSettings, GeneralSettings, KnowledgeSettings, PromptSettings, SearchSettings,
    Settings, WikipediaSettings,
};
