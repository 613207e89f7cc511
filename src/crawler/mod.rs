//! Crawler module for incremental listing crawls
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with cancellation
//! - Listing and detail page parsing
//! - Enclosure probing
//! - The bounded detail-fetch pool
//! - Overall crawl coordination

mod coordinator;
mod enclosure;
mod fetcher;
mod item;
mod listing;
mod parser;
mod pool;

#[cfg(test)]
mod test_support;

pub use coordinator::{is_cancellation, run_crawl, Coordinator, CrawlOutcome};
pub use enclosure::{EnclosureResolution, EnclosureResolver};
pub use fetcher::{build_http_client, HttpClient, ProbeResponse, ReqwestClient};
pub use item::ItemFetcher;
pub use listing::ListPageFetcher;
pub use parser::{HtmlPageParser, ListPage, PageParser};

use crate::config::Config;
use crate::TallrError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs one crawl as described by a configuration
///
/// This is the main entry point for a configured crawl. It will:
/// 1. Build the HTTP client from the `[http]` section
/// 2. Start from the configured cutoff, or the epoch if there is none
/// 3. Walk listings and fetch new items
/// 4. Return the items together with the advanced cutoff
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `cancel` - Cancels every outstanding request when triggered
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - The crawl ran; individual page and item failures
///   are in `CrawlOutcome::errors`
/// * `Err(TallrError)` - The HTTP client could not be built
pub async fn crawl(config: &Config, cancel: CancellationToken) -> Result<CrawlOutcome, TallrError> {
    let client = ReqwestClient::new(&config.http)?;
    let coordinator = Coordinator::new(Arc::new(client), Arc::new(HtmlPageParser::new()));

    let cutoff = config
        .crawler
        .cached_until
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    Ok(run_crawl(
        &coordinator,
        &config.crawler.source_url,
        config.crawler.page_limit,
        config.crawler.concurrency,
        cutoff,
        cancel,
    )
    .await)
}
