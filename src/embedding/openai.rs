//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::{Credentials, EmbeddingSettings};
use crate::error::{Result, SporError};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI has a limit on batch size.
const BATCH_SIZE: usize = 100;

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    pub fn new(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
        dimensions: usize,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimensions,
        }
    }

    /// Create an embedder from settings and resolved credentials.
    pub fn from_settings(settings: &EmbeddingSettings, credentials: &Credentials) -> Result<Self> {
        let client = create_client(credentials, Duration::from_secs(settings.timeout_secs))?;
        Ok(Self::new(client, &settings.model, settings.dimensions as usize))
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SporError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| SporError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| SporError::Embedding(format!("Embedding API error: {}", e)))?;

            // Sort by index to ensure correct order
            let mut embeddings = response.data;
            embeddings.sort_by_key(|e| e.index);

            if embeddings.len() != chunk.len() {
                return Err(SporError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    chunk.len(),
                    embeddings.len()
                )));
            }

            all_embeddings.extend(embeddings.into_iter().map(|e| e.embedding));
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
