//! Wikipedia lookup through the MediaWiki API.

use crate::agent::{ParamKind, ParamSpec, Tool, ToolArguments, ToolResult, ToolSpec};
use crate::config::WikipediaSettings;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Tool name the model calls.
pub const WIKIPEDIA_TOOL: &str = "wikipedia";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: Option<String>,
    extract: Option<String>,
}

/// An article title with the start of its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub extract: String,
}

/// Looks up the best-matching Wikipedia article for a query.
pub struct WikipediaTool {
    spec: ToolSpec,
    http: reqwest::Client,
    base_url: String,
    extract_chars: usize,
}

impl WikipediaTool {
    pub fn new(settings: &WikipediaSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("spor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            spec: ToolSpec::new(
                WIKIPEDIA_TOOL,
                "Look up a topic on Wikipedia and return the article title with a short extract",
                vec![ParamSpec::required(
                    "query",
                    ParamKind::String,
                    "Topic or article title to look up",
                )],
            ),
            http,
            base_url: settings.base_url.clone(),
            extract_chars: settings.extract_chars,
        })
    }

    /// Find the best-matching article, or `None` when nothing matches.
    #[instrument(skip(self))]
    pub async fn lookup(&self, query: &str) -> Result<Option<Article>> {
        let search: SearchResponse = self
            .http
            .get(&self.base_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "1"),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(title) = search
            .query
            .and_then(|q| q.search.into_iter().next())
            .map(|entry| entry.title)
        else {
            debug!("No article matched");
            return Ok(None);
        };

        let extracts: ExtractResponse = self
            .http
            .get(&self.base_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let page = extracts
            .query
            .and_then(|q| q.pages.into_values().find(|p| p.extract.is_some()));

        Ok(page.map(|p| Article {
            title: p.title.unwrap_or(title),
            extract: truncate_chars(p.extract.unwrap_or_default().trim(), self.extract_chars),
        }))
    }
}

fn not_found(query: &str) -> String {
    format!("No Wikipedia article found for '{}'.", query)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &ToolArguments) -> Result<ToolResult> {
        let query = args.require_str("query")?;
        let text = match self.lookup(query).await? {
            Some(article) if !article.extract.is_empty() => {
                format!("{}\n\n{}", article.title, article.extract)
            }
            _ => not_found(query),
        };
        Ok(ToolResult::Text(text))
    }

    fn fallback(&self, args: &ToolArguments) -> ToolResult {
        ToolResult::Text(not_found(args.get_str("query").unwrap_or_default()))
    }
}
