//! Concrete tools the chat agent can call.

mod knowledge_base;
mod web_search;
mod wikipedia;

pub use knowledge_base::{KnowledgeBaseTool, KNOWLEDGE_BASE_TOOL};
pub use web_search::{WebSearchTool, WEB_SEARCH_TOOL};
pub use wikipedia::{Article, WikipediaTool, WIKIPEDIA_TOOL};
