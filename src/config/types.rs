use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Main configuration structure for Tallr
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// First listing page of the source
    #[serde(rename = "source-url")]
    pub source_url: String,

    /// Maximum number of listing pages walked per run (0 is treated as 1)
    #[serde(rename = "page-limit", default = "default_page_limit")]
    pub page_limit: usize,

    /// Maximum number of detail pages fetched at once (0 is treated as 1)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Items published at or before this instant are considered known
    #[serde(rename = "cached-until", default)]
    pub cached_until: Option<DateTime<Utc>>,
}

impl CrawlerConfig {
    /// Creates a crawler section for `source_url` with default limits
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            page_limit: default_page_limit(),
            concurrency: default_concurrency(),
            cached_until: None,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_page_limit() -> usize {
    5
}

fn default_concurrency() -> usize {
    10
}

fn default_user_agent() -> String {
    format!("tallr/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}
