use crate::error::Result;
use async_trait::async_trait;

/// Raw response of a page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// URL the body was served from, after redirects
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl FetchResponse {
    /// A successful response carrying `body`
    pub fn ok_with_body(url: &str, body: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            status: 200,
            status_text: "OK".to_string(),
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability used to download a page.
///
/// Implementations make exactly one attempt per call; retries, cookies and
/// authentication are their own business.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the page at `url`
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;

    /// Release whatever the fetcher holds open; called once when a run ends
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
