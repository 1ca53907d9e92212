use crate::config::default_user_agent;
use crate::crawlers::crawler::{FetchResponse, Fetcher};
use crate::error::{ExtractError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Per-request timeout for page downloads
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Fetches pages with plain HTTP GET requests
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher sending `user_agent` with every request
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExtractError::Fetch(e.to_string()))?;

        Ok(Self { client })
    }

    /// Create a fetcher from an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::with_client(
            reqwest::Client::builder()
                .user_agent(default_user_agent())
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        )
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        ::log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExtractError::Fetch(e.to_string()))?;

        // Relative links resolve against where the body was actually served from
        let final_url = response.url().to_string();
        if final_url != url {
            ::log::debug!("Redirected from {} to {}", url, final_url);
        }

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| ExtractError::Fetch(e.to_string()))?;

        Ok(FetchResponse {
            url: final_url,
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}
