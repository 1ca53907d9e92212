use crate::extract::field::FieldDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// How to enumerate the result pages of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationConfig {
    /// URL of the listing, without the page parameter
    pub base_url: String,

    /// Name of the query parameter carrying the page number
    pub page_param: String,

    /// Starting page as typed by the user; non-numeric input means 1
    #[serde(default = "default_page_param_value")]
    pub page_param_value: String,

    /// Number of pages to fetch
    #[serde(default = "default_max_pages")]
    pub max_pages: i64,

    /// Static query parameters added to every page URL
    #[serde(default)]
    pub other_params: BTreeMap<String, String>,
}

impl PaginationConfig {
    /// Create a pagination plan starting at page 1
    pub fn new(base_url: &str, page_param: &str, max_pages: i64) -> Self {
        Self {
            base_url: base_url.to_string(),
            page_param: page_param.to_string(),
            page_param_value: default_page_param_value(),
            max_pages,
            other_params: BTreeMap::new(),
        }
    }

    /// Add a static query parameter
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.other_params.insert(name.to_string(), value.to_string());
        self
    }

    /// Set the starting page value
    pub fn with_start(mut self, value: &str) -> Self {
        self.page_param_value = value.to_string();
        self
    }
}

/// Everything a paginated extraction run needs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfig {
    /// CSS selector of the repeating root element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_selector: Option<String>,

    /// Fields extracted from every root element
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationConfig>,

    /// Pause between two page requests, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// User agent sent with HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// WebDriver endpoint used to render pages instead of plain HTTP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webdriver_url: Option<String>,
}

impl ExtractionConfig {
    /// Create a configuration with default run settings
    pub fn new(root_selector: &str, fields: Vec<FieldDescriptor>, pagination: PaginationConfig) -> Self {
        Self {
            root_selector: Some(root_selector.to_string()),
            fields,
            pagination: Some(pagination),
            delay_ms: default_delay_ms(),
            user_agent: default_user_agent(),
            webdriver_url: None,
        }
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Delay between page requests
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Default starting page value
fn default_page_param_value() -> String {
    "1".to_string()
}

/// Default number of pages
fn default_max_pages() -> i64 {
    1
}

/// Default delay between page requests
pub(crate) fn default_delay_ms() -> u64 {
    500
}

/// Default user agent for HTTP requests
pub(crate) fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
