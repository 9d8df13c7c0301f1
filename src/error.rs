use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No provider found for supplied URL: {url}")]
    UnknownProvider { url: String },

    #[error("Upstream provider error: {0}")]
    UpstreamError(String),

    #[error("Failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Failed to fetch content: {0}")]
    FetchError(String),

    #[error("Request timeout: {0}")]
    TimeoutError(String),

    #[error("Failed to extract metadata: {0}")]
    ExtractError(String),

    #[error("Invalid provider pattern: {0}")]
    InvalidPattern(String),
}

impl ResolveError {
    pub fn unknown_provider(url: impl Into<String>) -> Self {
        ResolveError::UnknownProvider { url: url.into() }
    }

    pub fn is_unknown_provider(&self) -> bool {
        matches!(self, ResolveError::UnknownProvider { .. })
    }

    pub fn log(&self) {
        match self {
            ResolveError::UnknownProvider { url } => {
                warn!(url = %url, "No preview could be resolved");
            }
            ResolveError::UpstreamError(e) => {
                error!(error = %e, "Known provider request failed");
            }
            ResolveError::UrlParseError(e) => {
                warn!(error = %e, "URL parsing failed");
            }
            ResolveError::FetchError(e) => {
                warn!(error = %e, "Content fetch failed");
            }
            ResolveError::TimeoutError(e) => {
                warn!(error = %e, "Request timed out");
            }
            ResolveError::ExtractError(e) => {
                error!(error = %e, "Metadata extraction failed");
            }
            ResolveError::InvalidPattern(e) => {
                error!(error = %e, "Provider registry pattern rejected");
            }
        }
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ResolveError::TimeoutError(e.to_string())
        } else {
            ResolveError::FetchError(e.to_string())
        }
    }
}
