//! Search over the user's indexed documents.

use crate::agent::{ParamKind, ParamSpec, Tool, ToolArguments, ToolResult, ToolSpec};
use crate::error::Result;
use crate::rag::{ContextBuilder, ContextChunk};
use async_trait::async_trait;

/// Tool name the model calls.
pub const KNOWLEDGE_BASE_TOOL: &str = "knowledge_base";

const NO_RESULTS: &str = "No relevant results found.";

/// Returns the closest document chunks with their file names.
pub struct KnowledgeBaseTool {
    spec: ToolSpec,
    context: ContextBuilder,
}

impl KnowledgeBaseTool {
    pub fn new(context: ContextBuilder) -> Self {
        Self {
            spec: ToolSpec::new(
                KNOWLEDGE_BASE_TOOL,
                "Search the user's own documents for passages relevant to a query",
                vec![ParamSpec::required(
                    "query",
                    ParamKind::String,
                    "What to look for in the documents",
                )],
            ),
            context,
        }
    }
}

fn format_chunks(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("Source: {}\n{}", c.source, c.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for KnowledgeBaseTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &ToolArguments) -> Result<ToolResult> {
        let query = args.require_str("query")?;
        let chunks = self.context.build(query).await?;
        if chunks.is_empty() {
            return Ok(ToolResult::Text(NO_RESULTS.to_string()));
        }
        Ok(ToolResult::Text(format_chunks(&chunks)))
    }

    fn fallback(&self, _args: &ToolArguments) -> ToolResult {
        ToolResult::Text(NO_RESULTS.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::KeywordEmbedder;
    use crate::vector_store::{Document, MemoryVectorStore, VectorStore};
    use serde_json::json;
    use std::sync::Arc;

    fn args(query: &str) -> ToolArguments {
        ToolArguments::from(json!({ "query": query }).as_object().unwrap().clone())
    }

    async fn tool(docs: &[Document]) -> KnowledgeBaseTool {
        let store = Arc::new(MemoryVectorStore::new());
        store.upsert_batch(docs).await.unwrap();
        let embedder = Arc::new(KeywordEmbedder {
            keywords: vec!["tea", "bike"],
        });
        KnowledgeBaseTool::new(ContextBuilder::new(store, embedder).with_min_score(0.5))
    }

    #[tokio::test]
    async fn test_returns_matching_chunks_with_sources() {
        let tool = tool(&[
            Document::new("tea.md", "Green tea steeps for two minutes.", 0, vec![1.0, 0.0]),
            Document::new("bike.md", "Oil the bike chain monthly.", 0, vec![0.0, 1.0]),
        ])
        .await;

        let result = tool.invoke(&args("how long for tea")).await.unwrap();
        assert_eq!(
            result,
            ToolResult::Text("Source: tea.md\nGreen tea steeps for two minutes.".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_match_is_no_results_text() {
        let tool = tool(&[]).await;
        let result = tool.invoke(&args("anything")).await.unwrap();
        assert_eq!(result.to_content().unwrap(), NO_RESULTS);
        assert_eq!(tool.spec().name, KNOWLEDGE_BASE_TOOL);
    }
}
