//! Retrieval-augmented question answering over local documents.

pub mod context;
mod engine;

pub use context::ContextBuilder;
pub use engine::{QaEngine, QaResponse, NO_CONTEXT_ANSWER};

use crate::vector_store::SearchResult;

/// A retrieved chunk ready for a prompt or for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextChunk {
    /// File the chunk came from.
    pub source: String,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
    /// Order of the chunk within its source.
    pub order: usize,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            source: result.document.source,
            content: result.document.content,
            score: result.score,
            order: result.document.order,
        }
    }
}
