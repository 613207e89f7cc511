//! Tallr: an incremental podcast listing crawler
//!
//! This crate walks a paginated listing source, picks out the items published
//! after a cutoff, and fetches full metadata for each through a bounded pool
//! of workers. Repeated runs feed the returned cutoff back in so that only new
//! items are fetched.

pub mod config;
pub mod crawler;
pub mod state;
pub mod url;

use std::fmt;
use thiserror::Error;

/// Main error type for Tallr operations
#[derive(Debug, Error)]
pub enum TallrError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("{0}")]
    Crawl(#[from] CrawlErrors),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Transport-level failures of a single request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} was cancelled")]
    Cancelled { url: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl FetchError {
    /// Returns the URL the failed request was aimed at
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Connect { url, .. }
            | Self::Status { url, .. }
            | Self::Transport { url, .. }
            | Self::Cancelled { url }
            | Self::InvalidUrl { url, .. } => url,
        }
    }

    /// Returns true if the request failed because the run was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// A page whose structural anchor could not be located
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("No {anchor} element found on {url}")]
    MissingAnchor { url: String, anchor: &'static str },
}

/// A single page-level or item-level failure recorded during a crawl
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Every failure of one crawl run, in the order they were recorded
///
/// A run never stops at its first failure; the causes are collected here and
/// handed back next to whatever items did succeed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlErrors {
    causes: Vec<CrawlError>,
}

impl CrawlErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: CrawlError) {
        self.causes.push(error);
    }

    pub fn len(&self) -> usize {
        self.causes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CrawlError> {
        self.causes.iter()
    }

    /// Returns `None` when nothing failed
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl From<Vec<CrawlError>> for CrawlErrors {
    fn from(causes: Vec<CrawlError>) -> Self {
        Self { causes }
    }
}

impl IntoIterator for CrawlErrors {
    type Item = CrawlError;
    type IntoIter = std::vec::IntoIter<CrawlError>;

    fn into_iter(self) -> Self::IntoIter {
        self.causes.into_iter()
    }
}

impl fmt::Display for CrawlErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.causes.as_slice() {
            [] => write!(f, "no errors"),
            [only] => write!(f, "{}", only),
            causes => {
                write!(f, "{} errors occurred: ", causes.len())?;
                for (i, cause) in causes.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", cause)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CrawlErrors {}

/// Result type alias for Tallr operations
pub type Result<T> = std::result::Result<T, TallrError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, run_crawl, Coordinator, CrawlOutcome};
pub use state::{CrawlState, Enclosure, Item, ListItem};

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(url: &str) -> CrawlError {
        CrawlError::Fetch(FetchError::Status {
            url: url.to_string(),
            status: 500,
        })
    }

    #[test]
    fn test_empty_errors_into_option() {
        assert!(CrawlErrors::new().into_option().is_none());
    }

    #[test]
    fn test_single_error_display() {
        let errors = CrawlErrors::from(vec![status_error("https://example.com/a")]);
        assert_eq!(errors.to_string(), "HTTP 500 for https://example.com/a");
    }

    #[test]
    fn test_multiple_errors_keep_order() {
        let mut errors = CrawlErrors::new();
        errors.push(status_error("https://example.com/a"));
        errors.push(CrawlError::Parse(ParseError::MissingAnchor {
            url: "https://example.com/b".to_string(),
            anchor: "#article",
        }));

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "2 errors occurred: HTTP 500 for https://example.com/a; \
             No #article element found on https://example.com/b"
        );
    }

    #[test]
    fn test_fetch_error_url_and_cancelled() {
        let err = FetchError::Cancelled {
            url: "https://example.com/".to_string(),
        };
        assert!(err.is_cancelled());
        assert_eq!(err.url(), "https://example.com/");
    }
}
