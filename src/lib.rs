// Re-export modules
pub mod config;
pub mod crawlers;
pub mod error;
pub mod extract;
pub mod filter;
pub mod pages;
pub mod pagination;
pub mod parsers;
pub mod results;
pub mod selectors;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{ExtractionConfig, PaginationConfig};
pub use crawlers::{FetchResponse, Fetcher, HttpFetcher, WebDriverFetcher};
pub use error::{ExtractError, Result};
pub use extract::{FieldDescriptor, FieldKind, FieldType};
pub use pages::Extraction;
pub use pagination::{build_page_url, get_start_page};
pub use parsers::Document;
pub use results::{Dataset, ExtractedItem, ExtractionEvent, PagePosition};
