//! Context building for retrieval.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::sync::Arc;
use tracing::debug;

/// Embeds a query and fetches the closest chunks from the store.
#[derive(Clone)]
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_chunks: usize,
    min_score: f32,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            max_chunks: 5,
            min_score: 0.0,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Build context for a query.
    pub async fn build(&self, query: &str) -> Result<Vec<ContextChunk>> {
        if self.vector_store.document_count().await? == 0 {
            debug!("Store is empty, skipping query embedding");
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let results = self
            .vector_store
            .search_with_threshold(&query_embedding, self.max_chunks, self.min_score)
            .await?;

        Ok(results.into_iter().map(ContextChunk::from).collect())
    }
}

/// Format context chunks for a prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("---\n[{}] {}\n{}\n---", i + 1, chunk.source, chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format context chunks as a source list for the user.
pub fn format_context_for_display(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            format!(
                "{} (chunk {}, score: {:.2})",
                chunk.source, chunk.order, chunk.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
