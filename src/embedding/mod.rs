//! Embedding generation for semantic search and retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Embeds text as counts of a fixed keyword list, for tests.
#[cfg(test)]
pub(crate) struct KeywordEmbedder {
    pub keywords: Vec<&'static str>,
}

#[cfg(test)]
#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(self
            .keywords
            .iter()
            .map(|k| lower.matches(k).count() as f32)
            .collect())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.keywords.len()
    }
}
