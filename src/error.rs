use thiserror::Error;

/// Errors produced while configuring or running an extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The extraction configuration is incomplete or malformed
    #[error("invalid configuration: {}", .0.join("; "))]
    Config(Vec<String>),

    /// A CSS selector could not be parsed
    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    /// The server answered with a non-success status
    #[error("HTTP Error {status}: {status_text}")]
    Http { status: u16, status_text: String },

    /// The request never produced a response
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The response body was empty or whitespace only
    #[error("Empty response received")]
    EmptyResponse,

    /// The run was cancelled by the caller
    #[error("extraction cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    /// Builds an `InvalidSelector` error from any displayable parse failure
    pub fn invalid_selector(selector: &str, message: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
