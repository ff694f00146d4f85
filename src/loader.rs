//! Plain-text document loading for question answering.

use crate::error::{Result, SporError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extensions read as plain text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text"];

/// A document read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    /// File name relative to the loaded folder.
    pub filename: String,
    pub content: String,
}

/// Loads every text document in a folder.
pub struct DocsLoader {
    folder: PathBuf,
}

impl DocsLoader {
    pub fn new(folder: impl AsRef<Path>) -> Self {
        Self {
            folder: folder.as_ref().to_path_buf(),
        }
    }

    /// Read all text files in the folder, sorted by file name.
    ///
    /// Subdirectories and files with other extensions are skipped.
    pub fn load_texts(&self) -> Result<Vec<SourceText>> {
        if !self.folder.is_dir() {
            return Err(SporError::InvalidInput(format!(
                "Document folder not found: {}",
                self.folder.display()
            )));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.folder)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_text_file(path))
            .collect();
        paths.sort();

        let mut texts = Vec::with_capacity(paths.len());
        for path in paths {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            debug!("Reading {}", filename);
            let content = std::fs::read_to_string(&path)?;
            texts.push(SourceText { filename, content });
        }

        info!("Loaded {} documents from {}", texts.len(), self.folder.display());
        Ok(texts)
    }
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_text_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "# Beta").unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let texts = DocsLoader::new(dir.path()).load_texts().unwrap();

        assert_eq!(
            texts,
            vec![
                SourceText {
                    filename: "a.txt".to_string(),
                    content: "alpha".to_string(),
                },
                SourceText {
                    filename: "b.md".to_string(),
                    content: "# Beta".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_missing_folder_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = DocsLoader::new(dir.path().join("nope")).load_texts().unwrap_err();
        assert!(matches!(err, SporError::InvalidInput(_)));
    }
}
