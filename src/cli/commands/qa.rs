//! Document question answering command.

use super::{load_prompts, InputCommand};
use crate::agent::{ChatBackend, OpenAIChatBackend};
use crate::chunking::TextSplitter;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::error::Result;
use crate::loader::DocsLoader;
use crate::rag::QaEngine;
use crate::vector_store::MemoryVectorStore;
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Run the interactive document QA command.
pub async fn run_qa(docs: &str, top_k: Option<usize>, mut settings: Settings) -> anyhow::Result<()> {
    if let Some(k) = top_k {
        settings.knowledge.top_k = k;
    }

    preflight::check(&settings, Operation::Qa { docs })?;

    let backend = Arc::new(OpenAIChatBackend::from_settings(
        &settings.chat,
        &settings.chat_credentials()?,
    )?);
    let engine = build_engine(&settings, backend, docs).await?;

    println!("\n{}", style("Spor QA").bold().cyan());
    println!("{}\n", style("Ask about your documents, or 'exit' to quit.").dim());

    qa_loop(&engine, io::stdin().lock(), &mut io::stdout()).await?;
    Ok(())
}

/// Load, split, embed and index a folder of documents.
pub(super) async fn build_engine(
    settings: &Settings,
    backend: Arc<dyn ChatBackend>,
    docs: &str,
) -> Result<QaEngine> {
    let folder = Settings::expand_path(docs);
    let texts = DocsLoader::new(&folder).load_texts()?;
    if texts.is_empty() {
        Output::warning(&format!("No .txt or .md files in {}", folder.display()));
    }

    let splitter = TextSplitter::new(settings.knowledge.chunk_size, settings.knowledge.chunk_overlap)?;
    let chunks = splitter.split_documents(&texts);

    let embedder = Arc::new(OpenAIEmbedder::from_settings(
        &settings.embedding,
        &settings.embedding_credentials()?,
    )?);
    let engine = QaEngine::new(
        backend,
        Arc::new(MemoryVectorStore::new()),
        embedder,
        settings.knowledge.top_k,
        settings.knowledge.min_score,
    )
    .with_prompts(load_prompts(settings)?);

    let spinner = Output::spinner(&format!("Indexing {} chunks...", chunks.len()));
    let indexed = engine.index(&chunks).await;
    spinner.finish_and_clear();
    let indexed = indexed?;

    Output::success(&format!(
        "Indexed {} chunks from {} documents",
        indexed,
        texts.len()
    ));
    Ok(engine)
}

/// Answer one question per line until `exit`/`quit` or end of input.
pub(crate) async fn qa_loop<R: BufRead, W: Write>(
    engine: &QaEngine,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    loop {
        write!(out, "{} ", style("Question:").green().bold())?;
        out.flush()?;

        let mut buf = Vec::new();
        if input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(out)?;
            break;
        }
        let line = String::from_utf8_lossy(&buf);

        let question = match InputCommand::parse(&line) {
            InputCommand::Empty => continue,
            InputCommand::Exit => {
                writeln!(out, "Goodbye!")?;
                break;
            }
            // No history to clear, so the word is just a question.
            InputCommand::Clear => line.trim(),
            InputCommand::Message(text) => text,
        };

        let spinner = Output::spinner("Searching documents...");
        let outcome = engine.ask(question).await;
        spinner.finish_and_clear();

        match outcome {
            Ok(response) => writeln!(out, "\n{}\n", response.format_for_display())?,
            Err(e) => {
                writeln!(out, "{} {}", style("Error:").red().bold(), e)?;
                if !e.is_turn_level() {
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{text, ScriptedBackend};
    use crate::chunking::TextChunk;
    use crate::embedding::KeywordEmbedder;
    use crate::error::SporError;

    #[tokio::test]
    async fn test_qa_loop_answers_until_quit() {
        let backend = ScriptedBackend::new(vec![text("Brew for three minutes.")]);
        let engine = QaEngine::new(
            backend.clone(),
            Arc::new(MemoryVectorStore::new()),
            Arc::new(KeywordEmbedder {
                keywords: vec!["tea"],
            }),
            3,
            0.1,
        );
        engine
            .index(&[TextChunk {
                source: "tea.md".to_string(),
                content: "Black tea: three minutes.".to_string(),
                order: 0,
            }])
            .await
            .unwrap();

        let mut out = Vec::new();
        qa_loop(&engine, "how long to brew tea?\nquit\nmore tea?\n".as_bytes(), &mut out)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Brew for three minutes."));
        assert!(out.contains("tea.md"));
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_qa_loop_stops_on_config_error() {
        let backend = ScriptedBackend::new(vec![Err(SporError::Config("no key".to_string()))]);
        let engine = QaEngine::new(
            backend.clone(),
            Arc::new(MemoryVectorStore::new()),
            Arc::new(KeywordEmbedder {
                keywords: vec!["tea"],
            }),
            3,
            0.1,
        );
        engine
            .index(&[TextChunk {
                source: "tea.md".to_string(),
                content: "Green tea.".to_string(),
                order: 0,
            }])
            .await
            .unwrap();

        let mut out = Vec::new();
        let err = qa_loop(&engine, "tea?\nmore tea?\n".as_bytes(), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, SporError::Config(_)));
        assert_eq!(backend.requests().len(), 1);
    }
}
