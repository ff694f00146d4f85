//! Prompt templates for Spor.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    pub qa: QaPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the tool-calling chat agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub system: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a helpful assistant.

You may have tools available:
- 'search_tool' searches the web for up-to-date information
- 'wikipedia' looks up a Wikipedia article and returns a short extract
- 'knowledge_base' searches the user's own documents

Call a tool only when you need information you do not already have.
When a tool returns nothing useful, say so instead of guessing.
Cite links from search results when you use them."#
                .to_string(),
        }
    }
}

/// Prompts for retrieval question answering over local documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPrompts {
    pub system: String,
    pub user: String,
}

impl Default for QaPrompts {
    fn default() -> Self {
        Self {
            system: r#"You answer questions about the user's documents.

Guidelines:
- Answer using only the provided content
- Mention the source file when it helps the reader
- If the content does not answer the question, say so clearly"#
                .to_string(),

            user: r#"Answer using the following content:

{{context}}

Question: {{question}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }

            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                let content = std::fs::read_to_string(&qa_path)?;
                prompts.qa = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
