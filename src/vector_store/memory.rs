//! In-memory vector store implementation.
//!
//! Scores every document on each search, which is fine for a folder of notes.

use super::{cosine_similarity, Document, SearchResult, VectorStore};
use crate::error::{Result, SporError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Document>>> {
        self.documents
            .read()
            .map_err(|_| SporError::VectorStore("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Document>>> {
        self.documents
            .write()
            .map_err(|_| SporError::VectorStore("store lock poisoned".to_string()))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, doc: &Document) -> Result<()> {
        self.write()?.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.write()?;
        for doc in docs {
            store.insert(doc.id.clone(), doc.clone());
        }
        Ok(docs.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, f32::MIN).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.read()?;

        let mut results: Vec<SearchResult> = docs
            .values()
            .map(|doc| SearchResult {
                score: cosine_similarity(query_embedding, &doc.embedding),
                document: doc.clone(),
            })
            .filter(|r| r.score >= min_score)
            .collect();

        // Ties keep source order so results are stable.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.source.cmp(&b.document.source))
                .then_with(|| a.document.order.cmp(&b.document.order))
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
