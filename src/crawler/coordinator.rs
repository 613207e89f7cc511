//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the run loop that ties the crawl together:
//! - Walking listing pages one at a time, newest first
//! - Selecting references published after the cutoff
//! - Dispatching them to the bounded detail-fetch pool
//! - Collecting items and failures, then advancing the cutoff

use crate::crawler::fetcher::HttpClient;
use crate::crawler::item::ItemFetcher;
use crate::crawler::listing::ListPageFetcher;
use crate::crawler::parser::PageParser;
use crate::crawler::pool::WorkerPool;
use crate::state::{CrawlState, Item};
use crate::url::dedup_key;
use crate::{CrawlError, CrawlErrors};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Result of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Newly fetched items, newest first
    pub items: Vec<Item>,

    /// Cutoff to pass to the next run
    pub cached_until: DateTime<Utc>,

    /// Everything that failed, or `None` if nothing did
    ///
    /// Failures are not fatal: `items` still holds whatever succeeded.
    pub errors: Option<CrawlErrors>,
}

/// Main crawler coordinator structure
#[derive(Clone)]
pub struct Coordinator {
    listings: ListPageFetcher,
    items: ItemFetcher,
}

impl Coordinator {
    /// Creates a coordinator over the given transport and page parser
    pub fn new(client: Arc<dyn HttpClient>, parser: Arc<dyn PageParser>) -> Self {
        Self {
            listings: ListPageFetcher::new(client.clone(), parser.clone()),
            items: ItemFetcher::new(client, parser),
        }
    }

    /// Runs one incremental crawl over `state`
    ///
    /// # Run Phases
    ///
    /// 1. Walk listing pages from `state.source_url`, at most
    ///    `state.page_limit` of them, stopping early at the last page or at a
    ///    page with no reference newer than `state.cached_until`
    /// 2. Submit each new reference once (by normalized URL) to a pool of
    ///    `state.concurrency` workers; submission waits while the pool is busy
    /// 3. Drain items and failures while the workers run
    /// 4. Join everything, sort items newest first, and move
    ///    `state.cached_until` to the newest publish time
    ///
    /// A listing page that fails is recorded and ends the walk, since it
    /// provides no next link. Cancelling `cancel` makes every outstanding
    /// request fail fast; the run still drains and returns normally.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Every page and item was fetched
    /// * `Err(CrawlErrors)` - Some pages or items failed; `state.items` still
    ///   holds everything that succeeded
    pub async fn run(
        &self,
        state: &mut CrawlState,
        cancel: &CancellationToken,
    ) -> Result<(), CrawlErrors> {
        state.coerce_limits();
        state.items.clear();
        let cutoff = state.cached_until;

        tracing::info!(
            "Starting crawl of {} (page limit {}, concurrency {}, cached until {})",
            state.source_url,
            state.page_limit,
            state.concurrency,
            cutoff
        );

        let pool = WorkerPool::spawn(state.concurrency, self.items.clone(), cancel.clone());
        let pages_walked = self
            .walk(&state.source_url, state.page_limit, cutoff, &pool, cancel)
            .await;
        let (items, errors) = pool.finish().await;

        let fetched = items.len();
        let items: Vec<Item> = items
            .into_iter()
            .filter(|item| item.published_at > cutoff)
            .collect();
        if items.len() < fetched {
            tracing::debug!(
                "Discarded {} items whose detail page predates the cutoff",
                fetched - items.len()
            );
        }

        state.finalize(items);

        tracing::info!(
            "Crawl finished: {} pages walked, {} new items, {} errors, cached until {}",
            pages_walked,
            state.items.len(),
            errors.len(),
            state.cached_until
        );

        match CrawlErrors::from(errors).into_option() {
            Some(errors) => Err(errors),
            None => Ok(()),
        }
    }

    /// Walks listing pages and submits new references; returns pages walked
    async fn walk(
        &self,
        source_url: &str,
        page_limit: usize,
        cutoff: DateTime<Utc>,
        pool: &WorkerPool,
        cancel: &CancellationToken,
    ) -> usize {
        let mut dispatched = HashSet::new();
        let mut next_url = Some(source_url.to_string());
        let mut pages = 0;

        while let Some(page_url) = next_url.take() {
            pages += 1;

            match self.listings.fetch(&page_url, cancel).await {
                Ok(page) => {
                    let mut new_items = 0;
                    for entry in page.items {
                        if entry.published_at <= cutoff {
                            continue;
                        }
                        new_items += 1;

                        if dispatched.insert(dedup_key(&entry.url)) {
                            pool.submit(entry).await;
                        } else {
                            tracing::debug!("Skipping duplicate item {}", entry.url);
                        }
                    }

                    tracing::debug!("Page {} ({}) had {} new items", pages, page_url, new_items);

                    if new_items == 0 {
                        tracing::debug!("No new items on {}, stopping walk", page_url);
                    } else {
                        next_url = page.next_page_url;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to walk listing {}: {}", page_url, e);
                    pool.report(e).await;
                }
            }

            if pages >= page_limit {
                if next_url.is_some() {
                    tracing::debug!("Page limit {} reached", page_limit);
                }
                break;
            }
        }

        pages
    }
}

/// Runs one crawl with explicit inputs and returns its outcome
///
/// This is a convenience over [`Coordinator::run`] for callers that keep the
/// cutoff themselves.
///
/// # Arguments
///
/// * `coordinator` - Transport and parser to crawl with
/// * `source_url` - First listing page
/// * `page_limit` - Maximum listing pages to walk (0 is treated as 1)
/// * `concurrency` - Maximum detail fetches in flight (0 is treated as 1)
/// * `cutoff` - Items published at or before this instant are skipped
/// * `cancel` - Cancels every outstanding request when triggered
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tallr::config::HttpConfig;
/// use tallr::crawler::{run_crawl, Coordinator, HtmlPageParser, ReqwestClient};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ReqwestClient::new(&HttpConfig::default())?;
/// let coordinator = Coordinator::new(Arc::new(client), Arc::new(HtmlPageParser::new()));
///
/// let outcome = run_crawl(
///     &coordinator,
///     "https://www.theguardian.com/news/series/todayinfocus",
///     5,
///     10,
///     chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
///     CancellationToken::new(),
/// )
/// .await;
/// println!("{} new items", outcome.items.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    coordinator: &Coordinator,
    source_url: &str,
    page_limit: usize,
    concurrency: usize,
    cutoff: DateTime<Utc>,
    cancel: CancellationToken,
) -> CrawlOutcome {
    let mut state = CrawlState::new(source_url)
        .with_page_limit(page_limit)
        .with_concurrency(concurrency)
        .with_cached_until(cutoff);

    let errors = coordinator.run(&mut state, &cancel).await.err();

    CrawlOutcome {
        items: state.items,
        cached_until: state.cached_until,
        errors,
    }
}

/// Returns true if `error` was caused by cancelling the run
pub fn is_cancellation(error: &CrawlError) -> bool {
    matches!(error, CrawlError::Fetch(e) if e.is_cancelled())
}
