use crate::config::ExtractionConfig;
use crate::crawlers::{Fetcher, HttpFetcher, WebDriverFetcher};
use crate::error::{ExtractError, Result};
use crate::extract::engine::{ValidationReport, validate_config};
use crate::pagination;
use crate::results::{Dataset, ExtractionEvent};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Builder struct for configuring and running a paginated extraction
pub struct Extraction {
    config: ExtractionConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
    cancel: CancellationToken,
}

impl Extraction {
    /// Create a new builder for the given configuration
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            fetcher: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Load the configuration from a JSON file
    pub fn with_config_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let config = ExtractionConfig::from_file(path)?;
        Ok(Self::new(config))
    }

    /// Use a specific fetch capability instead of the configured one
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Override the number of pages to fetch
    pub fn with_max_pages(mut self, max_pages: i64) -> Self {
        if let Some(pagination) = &mut self.config.pagination {
            pagination.max_pages = max_pages;
        }
        self
    }

    /// Override the delay between page requests
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.delay_ms = delay_ms;
        self
    }

    /// Override the WebDriver endpoint used to render pages
    pub fn with_webdriver_url(mut self, webdriver_url: &str) -> Self {
        self.config.webdriver_url = Some(webdriver_url.to_string());
        self
    }

    /// Share an externally owned cancellation token
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the run when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Check the configuration without starting anything
    pub fn validate(&self) -> ValidationReport {
        validate_config(
            self.config.root_selector.as_deref(),
            &self.config.fields,
            self.config.pagination.as_ref(),
        )
    }

    /// Start the run and get a receiver for its events
    pub async fn generate(self) -> Result<mpsc::Receiver<ExtractionEvent>> {
        self.validate().into_result()?;

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => default_fetcher(&self.config).await?,
        };

        pagination::start(&self.config, fetcher, self.cancel).await
    }

    /// Run to completion and gather every event into a dataset
    pub async fn collect(self) -> Result<Dataset> {
        let cancel = self.cancel.clone();
        let mut rx = self.generate().await?;

        let mut dataset = Dataset::new();
        while let Some(event) = rx.recv().await {
            dataset.push(event);
        }

        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }
        Ok(dataset)
    }
}

/// Fetch capability derived from the configuration
async fn default_fetcher(config: &ExtractionConfig) -> Result<Arc<dyn Fetcher>> {
    // Override the WebDriver URL with an environment variable if provided
    let webdriver_url = std::env::var("WEBDRIVER_URL")
        .ok()
        .filter(|url| !url.is_empty())
        .or_else(|| config.webdriver_url.clone());

    match webdriver_url {
        Some(url) => {
            let fetcher = WebDriverFetcher::connect(&url).await?;
            Ok(Arc::new(fetcher))
        }
        None => Ok(Arc::new(HttpFetcher::new(&config.user_agent)?)),
    }
}
