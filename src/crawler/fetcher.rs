//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests for listing and detail pages
//! - HEAD probes for enclosure metadata
//! - Error classification
//!
//! Every request races the run's cancellation token. No request is retried.

use crate::config::HttpConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Response};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Headers returned by a metadata-only probe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResponse {
    /// Content-Type header value
    pub content_type: Option<String>,

    /// Content-Length header value
    pub content_length: Option<u64>,
}

/// Transport used by the crawler
///
/// Implementations must return `FetchError::Cancelled` once `cancel` fires
/// and report non-success statuses as `FetchError::Status`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Retrieves the full body of a page
    async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<String, FetchError>;

    /// Retrieves only the headers of a resource
    async fn probe(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ProbeResponse, FetchError>;
}

/// [`HttpClient`] backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Builds a client from the HTTP configuration
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wraps an already configured reqwest client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Sends a request unless the run is cancelled first, and rejects
    /// non-success statuses
    async fn send<F>(
        &self,
        url: &str,
        cancel: &CancellationToken,
        request: F,
    ) -> Result<Response, FetchError>
    where
        F: Future<Output = Result<Response, reqwest::Error>>,
    {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
            result = request => result.map_err(|e| classify_error(url, e))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<String, FetchError> {
        let response = self.send(url, cancel, self.client.get(url).send()).await?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled { url: url.to_string() }),
            body = response.text() => body.map_err(|e| classify_error(url, e)),
        }
    }

    async fn probe(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ProbeResponse, FetchError> {
        let response = self.send(url, cancel, self.client.head(url).send()).await?;
        let headers = response.headers();

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        Ok(ProbeResponse {
            content_type,
            content_length,
        })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use tallr::config::HttpConfig;
/// use tallr::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Maps a reqwest failure onto the crawler's error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();

    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connect {
            url,
            message: error.to_string(),
        }
    } else if error.is_builder() {
        FetchError::InvalidUrl {
            url,
            message: error.to_string(),
        }
    } else if let Some(status) = error.status() {
        FetchError::Status {
            url,
            status: status.as_u16(),
        }
    } else {
        FetchError::Transport {
            url,
            message: error.to_string(),
        }
    }
}
