//! Error types for Spor.

use thiserror::Error;

/// Library-level error type for Spor operations.
#[derive(Error, Debug)]
pub enum SporError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model's tool-call argument payload could not be decoded.
    #[error("Could not parse arguments for tool '{tool}': {reason}")]
    ToolInvocationParse { tool: String, reason: String },

    /// The model asked for a tool that is not registered.
    ///
    /// The transcript keeps the user message and the assistant request.
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Tool '{tool}' failed: {reason}")]
    ToolExecution { tool: String, reason: String },

    #[error("Chat endpoint error: {0}")]
    Endpoint(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("DashScope request {request_id} failed with {code}: {message}")]
    DashScope {
        request_id: String,
        code: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SporError {
    /// Whether the error ends only the current turn and the session can continue.
    pub fn is_turn_level(&self) -> bool {
        !matches!(self, SporError::Config(_))
    }
}

/// Result type alias for Spor operations.
pub type Result<T> = std::result::Result<T, SporError>;
