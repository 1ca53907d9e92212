use crate::crawlers::crawler::{FetchResponse, Fetcher};
use crate::error::{ExtractError, Result};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use tokio::time::timeout;

/// Upper bound for navigating to a page and reading its source
const NAVIGATION_TIMEOUT: tokio::time::Duration = tokio::time::Duration::from_secs(45);

/// Endpoints tried when the configured WebDriver is unreachable
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4444", // Selenium / geckodriver default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Fetches pages through a WebDriver session so that scripts run before the
/// source is captured.
///
/// The rendered source carries no HTTP status, so a page that loads is
/// reported as `200 OK`.
pub struct WebDriverFetcher {
    client: Client,
    webdriver_url: String,
}

impl WebDriverFetcher {
    /// Connect to `webdriver_url`, falling back to common local endpoints
    pub async fn connect(webdriver_url: &str) -> Result<Self> {
        match ClientBuilder::native().connect(webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", webdriver_url);
                return Ok(Self {
                    client,
                    webdriver_url: webdriver_url.to_string(),
                });
            }
            Err(e) => {
                ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
            }
        }

        for url in FALLBACK_WEBDRIVER_URLS {
            if *url == webdriver_url {
                continue;
            }

            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = ClientBuilder::native().connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(Self {
                    client,
                    webdriver_url: url.to_string(),
                });
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(ExtractError::Fetch(format!(
            "no WebDriver server reachable at {webdriver_url}"
        )))
    }

    /// Endpoint of the active session
    pub fn webdriver_url(&self) -> &str {
        &self.webdriver_url
    }
}

#[async_trait]
impl Fetcher for WebDriverFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let rendered = timeout(NAVIGATION_TIMEOUT, async {
            self.client.goto(url).await?;
            let current = self.client.current_url().await?;
            let source = self.client.source().await?;
            Ok::<_, fantoccini::error::CmdError>((current, source))
        })
        .await;

        match rendered {
            Ok(Ok((current, source))) => Ok(FetchResponse::ok_with_body(current.as_str(), source)),
            Ok(Err(e)) => {
                if e.to_string().contains("Unable to find session") {
                    ::log::warn!("Lost WebDriver session while loading {}", url);
                }
                Err(ExtractError::Fetch(e.to_string()))
            }
            Err(_) => Err(ExtractError::Fetch(format!("timeout loading {url}"))),
        }
    }

    /// End the WebDriver session
    async fn close(&self) -> Result<()> {
        ::log::debug!("Closing WebDriver session at {}", self.webdriver_url);
        self.client
            .clone()
            .close()
            .await
            .map_err(|e| ExtractError::Fetch(e.to_string()))
    }
}
