//! Client for DashScope application completions.
//!
//! An application is configured in the Model Studio console (a knowledge
//! base, a prompt, a model); calling it only needs its ID and a prompt.

use crate::config::{Credentials, DashScopeSettings};
use crate::error::{Result, SporError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    input: CompletionInput<'a>,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct CompletionInput<'a> {
    prompt: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    request_id: String,
    output: Option<CompletionOutput>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionOutput {
    #[serde(default)]
    text: String,
}

/// A DashScope application bound to an app ID.
pub struct DashScopeApp {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    app_id: String,
}

impl DashScopeApp {
    pub fn new(settings: &DashScopeSettings, credentials: &Credentials, app_id: &str) -> Result<Self> {
        if app_id.trim().is_empty() {
            return Err(SporError::Config(
                "DashScope app_id is not set. Pass --app-id or set dashscope.app_id".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: credentials.base_url.clone(),
            api_key: credentials.api_key.clone(),
            app_id: app_id.trim().to_string(),
        })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Send a prompt to the application and return its text output.
    #[instrument(skip(self, prompt), fields(app_id = %self.app_id))]
    pub async fn call(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/apps/{}/completion", self.base_url, self.app_id);
        let request = CompletionRequest {
            input: CompletionInput { prompt },
            parameters: json!({}),
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: CompletionResponse = serde_json::from_str(&body).unwrap_or_default();
        debug!("DashScope responded with {} ({})", status, parsed.request_id);

        if !status.is_success() {
            return Err(SporError::DashScope {
                request_id: parsed.request_id,
                code: parsed.code.unwrap_or_else(|| status.as_u16().to_string()),
                message: parsed.message.unwrap_or(body),
            });
        }

        parsed.output.map(|o| o.text).ok_or_else(|| SporError::DashScope {
            request_id: parsed.request_id,
            code: status.as_u16().to_string(),
            message: "Response has no output".to_string(),
        })
    }
}
