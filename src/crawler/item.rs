//! Detail page fetcher

use crate::crawler::enclosure::EnclosureResolver;
use crate::crawler::fetcher::HttpClient;
use crate::crawler::parser::PageParser;
use crate::state::Item;
use crate::{CrawlError, FetchError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Retrieves one detail page and turns it into an [`Item`]
#[derive(Clone)]
pub struct ItemFetcher {
    client: Arc<dyn HttpClient>,
    parser: Arc<dyn PageParser>,
    enclosures: EnclosureResolver,
}

impl ItemFetcher {
    pub fn new(client: Arc<dyn HttpClient>, parser: Arc<dyn PageParser>) -> Self {
        let enclosures = EnclosureResolver::new(client.clone());
        Self {
            client,
            parser,
            enclosures,
        }
    }

    /// Fetches and parses `item_url`, then resolves its enclosure
    ///
    /// A failed enclosure probe is logged and leaves `enclosure` empty; the
    /// item itself is still returned.
    ///
    /// # Returns
    ///
    /// * `Ok(Item)` - The parsed item
    /// * `Err(CrawlError::Fetch)` - The detail page could not be retrieved
    /// * `Err(CrawlError::Parse)` - The page has no article element
    pub async fn fetch(&self, item_url: &str, cancel: &CancellationToken) -> Result<Item, CrawlError> {
        let url = Url::parse(item_url).map_err(|e| FetchError::InvalidUrl {
            url: item_url.to_string(),
            message: e.to_string(),
        })?;

        let body = self.client.get(url.as_str(), cancel).await?;
        let mut item = self.parser.parse_item_detail(&body, &url)?;

        if let Some(media_url) = item.enclosure.take().map(|e| e.url) {
            let resolution = self.enclosures.resolve(&media_url, cancel).await;
            if let Some(diagnostic) = resolution.diagnostic {
                tracing::warn!(
                    "Dropping enclosure for {}: {}",
                    item_url,
                    diagnostic
                );
            }
            item.enclosure = resolution.enclosure;
        }

        tracing::debug!("Fetched item {} ({})", item_url, item.title);
        Ok(item)
    }
}
