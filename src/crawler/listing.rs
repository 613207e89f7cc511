//! Listing page fetcher

use crate::crawler::fetcher::HttpClient;
use crate::crawler::parser::{ListPage, PageParser};
use crate::{CrawlError, FetchError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Retrieves and parses one listing page at a time
#[derive(Clone)]
pub struct ListPageFetcher {
    client: Arc<dyn HttpClient>,
    parser: Arc<dyn PageParser>,
}

impl ListPageFetcher {
    pub fn new(client: Arc<dyn HttpClient>, parser: Arc<dyn PageParser>) -> Self {
        Self { client, parser }
    }

    /// Fetches `page_url` and extracts its item references and next link
    ///
    /// # Returns
    ///
    /// * `Ok(ListPage)` - References in page order; `next_page_url` is `None`
    ///   on the last page
    /// * `Err(CrawlError::Fetch)` - The page could not be retrieved
    /// * `Err(CrawlError::Parse)` - The page has no main content section
    pub async fn fetch(
        &self,
        page_url: &str,
        cancel: &CancellationToken,
    ) -> Result<ListPage, CrawlError> {
        let url = Url::parse(page_url).map_err(|e| FetchError::InvalidUrl {
            url: page_url.to_string(),
            message: e.to_string(),
        })?;

        let body = self.client.get(url.as_str(), cancel).await?;
        let page = self.parser.parse_listing(&body, &url)?;

        tracing::debug!(
            "Listing {} has {} items (next: {})",
            page_url,
            page.items.len(),
            page.next_page_url.as_deref().unwrap_or("none")
        );

        Ok(page)
    }
}
