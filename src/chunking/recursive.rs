//! Recursive character splitting.
//!
//! Text is split on the coarsest separator present, pieces that are still too
//! long are split again with the next separator, and small pieces are merged
//! back into chunks of at most `chunk_size` characters with `chunk_overlap`
//! characters of trailing context.

use crate::error::{Result, SporError};
use std::collections::VecDeque;

/// Separators tried in order; the empty separator splits into characters.
const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Recursive character text splitter.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(SporError::InvalidInput(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(SporError::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split text into chunks of at most `chunk_size` characters.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut short_pieces: Vec<String> = Vec::new();

        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                short_pieces.push(piece);
                continue;
            }
            if !short_pieces.is_empty() {
                chunks.extend(self.merge(&short_pieces, separator));
                short_pieces.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_with(&piece, remaining));
            }
        }

        if !short_pieces.is_empty() {
            chunks.extend(self.merge(&short_pieces, separator));
        }

        chunks
    }

    /// Merge short pieces into chunks, keeping overlap between neighbours.
    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joined_len = |total: usize, current: &VecDeque<&str>| {
                total + len + if current.is_empty() { 0 } else { separator_len }
            };

            if joined_len(total, &current) > self.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);

                while total > self.chunk_overlap
                    || (joined_len(total, &current) > self.chunk_size && total > 0)
                {
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    let freed = char_len(front) + if current.is_empty() { 0 } else { separator_len };
                    total = total.saturating_sub(freed);
                }
            }

            if !current.is_empty() {
                total += separator_len;
            }
            current.push_back(piece.as_str());
            total += len;
        }

        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, current: &VecDeque<&str>, separator: &str) {
    let joined = current.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
