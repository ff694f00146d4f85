//! Question answering over the indexed documents.

use super::context::{format_context_for_display, format_context_for_prompt};
use super::{ContextBuilder, ContextChunk};
use crate::agent::{ChatBackend, Message};
use crate::chunking::TextChunk;
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::{Result, SporError};
use crate::vector_store::{Document, VectorStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answer given when retrieval finds nothing.
pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find any relevant information in the indexed documents for this question.";

/// Retrieval QA engine: one model call per question, no tools, no history.
pub struct QaEngine {
    backend: Arc<dyn ChatBackend>,
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    context_builder: ContextBuilder,
    prompts: Prompts,
}

impl QaEngine {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        top_k: usize,
        min_score: f32,
    ) -> Self {
        let context_builder = ContextBuilder::new(vector_store.clone(), embedder.clone())
            .with_max_chunks(top_k)
            .with_min_score(min_score);

        Self {
            backend,
            vector_store,
            embedder,
            context_builder,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Retriever over the same store, for the knowledge-base tool.
    pub fn context_builder(&self) -> ContextBuilder {
        self.context_builder.clone()
    }

    /// Embed and store chunks. Returns how many were stored.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn index(&self, chunks: &[TextChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(SporError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let documents: Vec<Document> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                Document::new(&chunk.source, &chunk.content, chunk.order, embedding)
            })
            .collect();

        let stored = self.vector_store.upsert_batch(&documents).await?;
        info!("Indexed {} chunks", stored);
        Ok(stored)
    }

    /// Top-k chunks for a question.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<ContextChunk>> {
        self.context_builder.build(question).await
    }

    /// Answer a question from the retrieved chunks.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<QaResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SporError::InvalidInput("Question is empty".to_string()));
        }

        let sources = self.retrieve(question).await?;
        if sources.is_empty() {
            return Ok(QaResponse {
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources,
            });
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(&sources));
        let user_prompt = self.prompts.render_with_custom(&self.prompts.qa.user, &vars);

        let messages = [
            Message::system(self.prompts.qa.system.clone()),
            Message::user(user_prompt),
        ];
        let reply = self.backend.complete(&messages, &[]).await?;

        debug!("Answered with {} sources", sources.len());
        Ok(QaResponse {
            answer: reply.content,
            sources,
        })
    }
}

/// An answer with the chunks it was built from.
#[derive(Debug, Clone)]
pub struct QaResponse {
    pub answer: String,
    pub sources: Vec<ContextChunk>,
}

impl QaResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        if self.sources.is_empty() {
            return self.answer.clone();
        }
        format!(
            "{}\n\n--- Sources ---\n{}",
            self.answer,
            format_context_for_display(&self.sources)
        )
    }
}
