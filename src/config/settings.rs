//! Configuration settings for Spor.

use crate::error::{Result, SporError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub chat: ChatSettings,
    pub search: SearchSettings,
    pub wikipedia: WikipediaSettings,
    pub embedding: EmbeddingSettings,
    pub knowledge: KnowledgeSettings,
    pub dashscope: DashScopeSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Hosted chat-completion provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatProvider {
    /// OpenAI chat completions (default).
    #[default]
    OpenAI,
    /// DeepSeek's OpenAI-compatible endpoint.
    DeepSeek,
}

impl std::str::FromStr for ChatProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ChatProvider::OpenAI),
            "deepseek" => Ok(ChatProvider::DeepSeek),
            _ => Err(format!("Unknown chat provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatProvider::OpenAI => write!(f, "openai"),
            ChatProvider::DeepSeek => write!(f, "deepseek"),
        }
    }
}

/// Chat-completion endpoint settings.
///
/// Fields missing from the config file come from the preset of the
/// configured provider, not from the OpenAI defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ChatSettingsFile")]
pub struct ChatSettings {
    /// Provider preset the remaining fields were derived from.
    pub provider: ChatProvider,
    /// API base URL (the client appends `/chat/completions`).
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::for_provider(ChatProvider::OpenAI)
    }
}

/// `[chat]` as written in the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatSettingsFile {
    provider: ChatProvider,
    base_url: Option<String>,
    model: Option<String>,
    api_key_env: Option<String>,
    timeout_secs: Option<u64>,
}

impl From<ChatSettingsFile> for ChatSettings {
    fn from(file: ChatSettingsFile) -> Self {
        let preset = ChatSettings::for_provider(file.provider);
        Self {
            provider: file.provider,
            base_url: file.base_url.unwrap_or(preset.base_url),
            model: file.model.unwrap_or(preset.model),
            api_key_env: file.api_key_env.unwrap_or(preset.api_key_env),
            timeout_secs: file.timeout_secs.unwrap_or(preset.timeout_secs),
        }
    }
}

impl ChatSettings {
    /// Preset endpoint settings for a provider.
    pub fn for_provider(provider: ChatProvider) -> Self {
        match provider {
            ChatProvider::OpenAI => Self {
                provider,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                timeout_secs: 300,
            },
            ChatProvider::DeepSeek => Self {
                provider,
                base_url: "https://api.deepseek.com".to_string(),
                model: "deepseek-chat".to_string(),
                api_key_env: "DEEPSEEK_API_KEY".to_string(),
                timeout_secs: 300,
            },
        }
    }
}

/// SerpAPI web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub base_url: String,
    pub api_key_env: String,
    /// Maximum number of results handed to the model.
    pub num_results: usize,
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://serpapi.com/search.json".to_string(),
            api_key_env: "SERPAPI_API_KEY".to_string(),
            num_results: 3,
            timeout_secs: 30,
        }
    }
}

/// Wikipedia lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikipediaSettings {
    /// MediaWiki API endpoint.
    pub base_url: String,
    /// Maximum characters of the article extract.
    pub extract_chars: usize,
    pub timeout_secs: u64,
}

impl Default for WikipediaSettings {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org/w/api.php".to_string(),
            extract_chars: 1200,
            timeout_secs: 30,
        }
    }
}

/// Embedding generation settings.
///
/// Embeddings always go to an OpenAI-compatible embeddings endpoint,
/// independent of the chat provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub api_key_env: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            timeout_secs: 120,
        }
    }
}

/// Document QA settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSettings {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters of trailing context carried into the next chunk.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Minimum similarity score for a retrieved chunk.
    pub min_score: f32,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            min_score: 0.0,
        }
    }
}

/// DashScope application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashScopeSettings {
    pub base_url: String,
    /// Application ID from the Model Studio console.
    pub app_id: Option<String>,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for DashScopeSettings {
    fn default() -> Self {
        Self {
            base_url: "https://dashscope.aliyuncs.com/api/v1".to_string(),
            app_id: None,
            api_key_env: "DASHSCOPE_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

/// Endpoint location and key, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub base_url: String,
    pub api_key: String,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SporError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spor")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Switch the chat endpoint to a provider preset, keeping the configured timeout.
    pub fn use_provider(&mut self, provider: ChatProvider) {
        let timeout_secs = self.chat.timeout_secs;
        self.chat = ChatSettings::for_provider(provider);
        self.chat.timeout_secs = timeout_secs;
    }

    /// Resolve the chat endpoint credentials.
    pub fn chat_credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            base_url: validate_url(&self.chat.base_url)?,
            api_key: api_key_from_env(&self.chat.api_key_env)?,
        })
    }

    /// Resolve the embeddings endpoint credentials.
    pub fn embedding_credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            base_url: validate_url(&self.embedding.base_url)?,
            api_key: api_key_from_env(&self.embedding.api_key_env)?,
        })
    }

    /// Resolve the web search credentials.
    pub fn search_credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            base_url: validate_url(&self.search.base_url)?,
            api_key: api_key_from_env(&self.search.api_key_env)?,
        })
    }

    /// Resolve the DashScope credentials.
    pub fn dashscope_credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            base_url: validate_url(&self.dashscope.base_url)?,
            api_key: api_key_from_env(&self.dashscope.api_key_env)?,
        })
    }
}

/// Read an API key from the named environment variable.
pub fn api_key_from_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        Ok(_) => Err(SporError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(SporError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

fn validate_url(raw: &str) -> Result<String> {
    url::Url::parse(raw).map_err(|e| SporError::Config(format!("Invalid URL '{}': {}", raw, e)))?;
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_round_trip() {
        assert_eq!("DeepSeek".parse::<ChatProvider>().unwrap(), ChatProvider::DeepSeek);
        assert_eq!(ChatProvider::OpenAI.to_string(), "openai");
        assert!("claude".parse::<ChatProvider>().is_err());
    }

    #[test]
    fn test_use_provider_keeps_timeout() {
        let mut settings = Settings::default();
        settings.chat.timeout_secs = 42;
        settings.use_provider(ChatProvider::DeepSeek);
        assert_eq!(settings.chat.base_url, "https://api.deepseek.com");
        assert_eq!(settings.chat.model, "deepseek-chat");
        assert_eq!(settings.chat.timeout_secs, 42);
    }

    #[test]
    fn test_provider_only_selects_its_preset() {
        let settings: Settings = toml::from_str("[chat]\nprovider = \"deepseek\"\n").unwrap();
        assert_eq!(settings.chat.provider, ChatProvider::DeepSeek);
        assert_eq!(settings.chat.base_url, "https://api.deepseek.com");
        assert_eq!(settings.chat.model, "deepseek-chat");
        assert_eq!(settings.chat.api_key_env, "DEEPSEEK_API_KEY");

        let settings: Settings =
            toml::from_str("[chat]\nprovider = \"deepseek\"\nmodel = \"deepseek-reasoner\"\n")
                .unwrap();
        assert_eq!(settings.chat.model, "deepseek-reasoner");
        assert_eq!(settings.chat.base_url, "https://api.deepseek.com");
    }

    #[test]
    fn test_use_provider_repairs_mismatched_endpoint() {
        let mut settings = Settings::default();
        settings.chat.provider = ChatProvider::DeepSeek;
        settings.use_provider(ChatProvider::DeepSeek);
        assert_eq!(settings.chat.base_url, "https://api.deepseek.com");
        assert_eq!(settings.chat.api_key_env, "DEEPSEEK_API_KEY");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [search]
            num_results = 5

            [chat]
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        assert_eq!(settings.search.num_results, 5);
        assert_eq!(settings.search.api_key_env, "SERPAPI_API_KEY");
        assert_eq!(settings.chat.model, "gpt-4o");
        assert_eq!(settings.chat.base_url, "https://api.openai.com/v1");
        assert_eq!(settings.knowledge.chunk_size, 1000);
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let mut settings = Settings::default();
        settings.chat.api_key_env = "SPOR_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        match settings.chat_credentials() {
            Err(SporError::Config(msg)) => assert!(msg.contains("SPOR_TEST_KEY_THAT_IS_NEVER_SET")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        assert!(matches!(validate_url("not a url"), Err(SporError::Config(_))));
        assert_eq!(
            validate_url("https://api.deepseek.com/").unwrap(),
            "https://api.deepseek.com"
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.dashscope.app_id = Some("app_123".to_string());
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.dashscope.app_id.as_deref(), Some("app_123"));
    }
}
