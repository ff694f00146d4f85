//! OpenAI-compatible client configuration.

use crate::config::Credentials;
use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for chat API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a client for an OpenAI-compatible endpoint.
///
/// The base URL selects the provider, so DeepSeek and OpenAI share this path.
pub fn create_client(credentials: &Credentials, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let config = OpenAIConfig::new()
        .with_api_base(&credentials.base_url)
        .with_api_key(&credentials.api_key);

    // A rate-limited call fails the turn instead of being retried.
    let no_retry = backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();

    Ok(Client::with_config(config)
        .with_http_client(http_client)
        .with_backoff(no_retry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_with_custom_base() {
        let credentials = Credentials {
            base_url: "https://api.deepseek.com".to_string(),
            api_key: "sk-test".to_string(),
        };
        let client = create_client(&credentials, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(client.is_ok());
    }
}
