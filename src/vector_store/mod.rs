//! Vector store abstraction.
//!
//! Provides a trait-based interface for different vector database backends.

mod memory;

pub use memory::MemoryVectorStore;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A document chunk stored in the vector database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID, `source#order`.
    pub id: String,
    /// File the chunk was cut from.
    pub source: String,
    /// Text content of this chunk.
    pub content: String,
    /// Order of this chunk within its source.
    pub order: usize,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn new(source: &str, content: &str, order: usize, embedding: Vec<f32>) -> Self {
        Self {
            id: format!("{}#{}", source, order),
            source: source.to_string(),
            content: content.to_string(),
            order,
            embedding,
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a document with its embedding, replacing any with the same ID.
    async fn upsert(&self, doc: &Document) -> Result<()>;

    /// Bulk upsert documents.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Search for similar documents.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Remove every document.
    async fn clear(&self) -> Result<()>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_document_id_from_source_and_order() {
        let doc = Document::new("notes.md", "content", 3, vec![]);
        assert_eq!(doc.id, "notes.md#3");
    }
}
