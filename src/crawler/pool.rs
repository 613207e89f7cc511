//! Bounded detail-fetch pool with fan-in
//!
//! This module handles:
//! - A fixed number of workers pulling item references from a one-slot intake
//! - Two drain tasks that collect items and errors while the workers run
//! - An ordered shutdown: close intake, join workers, join drains
//!
//! Workers never touch shared state. Each drain owns its accumulator and hands
//! it back through its join handle.

use crate::crawler::item::ItemFetcher;
use crate::state::{Item, ListItem};
use crate::CrawlError;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Capacity of the intake between the page walk and the workers
///
/// With one slot the walk can get at most one reference ahead of the pool.
const INTAKE_CAPACITY: usize = 1;

/// A running pool of detail-fetch workers
pub(crate) struct WorkerPool {
    intake: mpsc::Sender<ListItem>,
    errors: mpsc::Sender<CrawlError>,
    workers: Vec<JoinHandle<()>>,
    item_drain: JoinHandle<Vec<Item>>,
    error_drain: JoinHandle<Vec<CrawlError>>,
}

impl WorkerPool {
    /// Spawns `concurrency` workers and both drain tasks
    pub(crate) fn spawn(
        concurrency: usize,
        fetcher: ItemFetcher,
        cancel: CancellationToken,
    ) -> Self {
        let concurrency = concurrency.max(1);

        let (intake, jobs) = mpsc::channel::<ListItem>(INTAKE_CAPACITY);
        let (item_tx, item_rx) = mpsc::channel::<Item>(concurrency);
        let (error_tx, error_rx) = mpsc::channel::<CrawlError>(concurrency);

        let item_drain = tokio::spawn(drain(item_rx));
        let error_drain = tokio::spawn(drain(error_rx));

        let jobs = Arc::new(Mutex::new(jobs));
        let workers = (0..concurrency)
            .map(|id| {
                tokio::spawn(worker(
                    id,
                    jobs.clone(),
                    fetcher.clone(),
                    item_tx.clone(),
                    error_tx.clone(),
                    cancel.clone(),
                ))
            })
            .collect();

        tracing::debug!("Started {} detail workers", concurrency);

        Self {
            intake,
            errors: error_tx,
            workers,
            item_drain,
            error_drain,
        }
    }

    /// Hands a reference to the workers, waiting while the intake is full
    pub(crate) async fn submit(&self, entry: ListItem) {
        if let Err(rejected) = self.intake.send(entry).await {
            tracing::error!(
                "No detail worker left to take {}, skipping it",
                rejected.0.url
            );
        }
    }

    /// Records a failure that happened outside the workers
    pub(crate) async fn report(&self, error: CrawlError) {
        if self.errors.send(error).await.is_err() {
            tracing::error!("Error drain stopped early; a failure was not recorded");
        }
    }

    /// Stops intake, waits for every worker and both drains, and returns what
    /// they collected
    pub(crate) async fn finish(self) -> (Vec<Item>, Vec<CrawlError>) {
        let Self {
            intake,
            errors,
            workers,
            item_drain,
            error_drain,
        } = self;

        drop(intake);
        for handle in workers {
            if let Err(e) = handle.await {
                tracing::error!("Detail worker panicked: {}", e);
            }
        }

        // Workers held the other senders; this is the last one.
        drop(errors);

        let items = item_drain.await.unwrap_or_else(|e| {
            tracing::error!("Item drain panicked: {}", e);
            Vec::new()
        });
        let errors = error_drain.await.unwrap_or_else(|e| {
            tracing::error!("Error drain panicked: {}", e);
            Vec::new()
        });

        (items, errors)
    }
}

/// Fetches references until the intake is closed and empty
async fn worker(
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<ListItem>>>,
    fetcher: ItemFetcher,
    items: mpsc::Sender<Item>,
    errors: mpsc::Sender<CrawlError>,
    cancel: CancellationToken,
) {
    loop {
        let entry = { jobs.lock().await.recv().await };
        let Some(entry) = entry else {
            break;
        };

        match fetcher.fetch(&entry.url, &cancel).await {
            Ok(item) => {
                let item = with_listing_date(item, &entry);
                if items.send(item).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("Failed to fetch item {}: {}", entry.url, e);
                if errors.send(e).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::trace!("Detail worker {} finished", id);
}

/// Falls back to the listing's publish time when the detail page has none
fn with_listing_date(mut item: Item, entry: &ListItem) -> Item {
    if !item.has_published_at() {
        item.published_at = entry.published_at;
    }
    item
}

/// Collects every value sent on `rx` until all senders are gone
async fn drain<T>(mut rx: mpsc::Receiver<T>) -> Vec<T> {
    let mut collected = Vec::new();
    while let Some(value) = rx.recv().await {
        collected.push(value);
    }
    collected
}
