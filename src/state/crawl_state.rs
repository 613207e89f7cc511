//! State owned by a single crawl run

use crate::state::Item;
use chrono::{DateTime, Utc};

/// Everything one orchestrator run reads and writes
///
/// The caller owns this value and lends it to
/// [`Coordinator::run`](crate::crawler::Coordinator::run). To keep later runs
/// incremental across process restarts, persist `cached_until` and set it
/// again before the next run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlState {
    /// First listing page of the source
    pub source_url: String,

    /// Maximum number of listing pages walked per run
    pub page_limit: usize,

    /// Maximum number of detail fetches in flight
    pub concurrency: usize,

    /// Items fetched by the most recent run, newest first
    pub items: Vec<Item>,

    /// Items published at or before this instant are already known
    pub cached_until: DateTime<Utc>,
}

impl CrawlState {
    /// Creates a state for a first run: one page, one worker, no known items
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            page_limit: 1,
            concurrency: 1,
            items: Vec::new(),
            cached_until: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_cached_until(mut self, cached_until: DateTime<Utc>) -> Self {
        self.cached_until = cached_until;
        self
    }

    /// Coerces zero limits to 1
    pub(crate) fn coerce_limits(&mut self) {
        self.page_limit = self.page_limit.max(1);
        self.concurrency = self.concurrency.max(1);
    }

    /// Installs the items of a finished run and advances the cutoff
    ///
    /// Items are sorted newest first. The cutoff moves to the newest publish
    /// time and stays where it was when nothing was fetched.
    pub(crate) fn finalize(&mut self, mut items: Vec<Item>) {
        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        if let Some(newest) = items.first() {
            self.cached_until = newest.published_at;
        }

        self.items = items;
    }
}
