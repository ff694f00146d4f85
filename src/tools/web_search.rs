//! Web search through SerpAPI.

use crate::agent::{ParamKind, ParamSpec, SearchHit, Tool, ToolArguments, ToolResult, ToolSpec};
use crate::config::{Credentials, SearchSettings};
use crate::error::{Result, SporError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Tool name the model calls.
pub const WEB_SEARCH_TOOL: &str = "search_tool";

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

/// Searches the web and returns the top organic results.
pub struct WebSearchTool {
    spec: ToolSpec,
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    num_results: usize,
}

impl WebSearchTool {
    pub fn new(settings: &SearchSettings, credentials: &Credentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            spec: ToolSpec::new(
                WEB_SEARCH_TOOL,
                "Useful for when you need to search the web for up-to-date information",
                vec![ParamSpec::required("query", ParamKind::String, "Search query")],
            ),
            http,
            base_url: credentials.base_url.clone(),
            api_key: credentials.api_key.clone(),
            num_results: settings.num_results,
        })
    }

    /// Run a search and return at most `num_results` hits.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let num = self.num_results.to_string();
        let response: SerpResponse = self
            .http
            .get(&self.base_url)
            .query(&[("q", query), ("api_key", self.api_key.as_str()), ("num", num.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(SporError::ToolExecution {
                tool: WEB_SEARCH_TOOL.to_string(),
                reason: error,
            });
        }

        let hits: Vec<SearchHit> = response
            .organic_results
            .into_iter()
            .take(self.num_results)
            .map(|r| SearchHit {
                title: r.title.unwrap_or_default(),
                link: r.link.unwrap_or_default(),
                snippet: r.snippet.unwrap_or_default(),
            })
            .collect();

        debug!("Search returned {} results", hits.len());
        Ok(hits)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &ToolArguments) -> Result<ToolResult> {
        let query = args.require_str("query")?;
        Ok(ToolResult::Hits(self.search(query).await?))
    }

    fn fallback(&self, _args: &ToolArguments) -> ToolResult {
        ToolResult::Hits(Vec::new())
    }
}
