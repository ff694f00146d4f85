//! Pre-flight checks before talking to any endpoint.
//!
//! Every credential an operation needs is resolved up front, so a missing
//! key is reported before the first turn instead of in the middle of one.

use crate::config::Settings;
use crate::error::{Result, SporError};
use std::path::Path;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    /// Chat needs the chat key, plus search and embedding keys for the tools it offers.
    Chat {
        search: bool,
        docs: Option<&'a str>,
    },
    /// A one-shot question needs the chat key.
    Ask,
    /// Document QA needs chat and embedding keys and a readable folder.
    Qa { docs: &'a str },
    /// An application call needs the DashScope key and an app ID.
    App { app_id: Option<&'a str> },
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(settings: &Settings, operation: Operation<'_>) -> Result<()> {
    match operation {
        Operation::Chat { search, docs } => {
            settings.chat_credentials()?;
            if search {
                settings.search_credentials()?;
            }
            if let Some(dir) = docs {
                settings.embedding_credentials()?;
                check_folder(dir)?;
            }
        }
        Operation::Ask => {
            settings.chat_credentials()?;
        }
        Operation::Qa { docs } => {
            settings.chat_credentials()?;
            settings.embedding_credentials()?;
            check_folder(docs)?;
        }
        Operation::App { app_id } => {
            settings.dashscope_credentials()?;
            let configured = app_id.or(settings.dashscope.app_id.as_deref());
            if configured.map_or(true, |id| id.trim().is_empty()) {
                return Err(SporError::Config(
                    "No DashScope app ID. Pass --app-id or set dashscope.app_id".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn check_folder(dir: &str) -> Result<()> {
    let path = Settings::expand_path(dir);
    if Path::new(&path).is_dir() {
        Ok(())
    } else {
        Err(SporError::Config(format!(
            "Document folder not found: {}",
            path.display()
        )))
    }
}
