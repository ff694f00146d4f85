//! Text chunking for breaking documents into searchable pieces.

mod recursive;

pub use recursive::TextSplitter;

use crate::loader::SourceText;
use serde::{Deserialize, Serialize};

/// A chunk of text from a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// File the chunk came from.
    pub source: String,
    /// Text content of this chunk.
    pub content: String,
    /// Order of this chunk within its source.
    pub order: usize,
}

impl TextSplitter {
    /// Split every document, tagging chunks with their source file.
    pub fn split_documents(&self, documents: &[SourceText]) -> Vec<TextChunk> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .enumerate()
                    .map(|(order, content)| TextChunk {
                        source: doc.filename.clone(),
                        content,
                        order,
                    })
            })
            .collect()
    }
}
