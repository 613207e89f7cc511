//! In-memory HTTP double and HTML fixtures shared by the crawler tests

use crate::crawler::fetcher::{HttpClient, ProbeResponse};
use crate::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Serves canned pages and probes; unknown URLs answer 404
#[derive(Default)]
pub(crate) struct MockHttpClient {
    pages: HashMap<String, String>,
    probes: HashMap<String, ProbeResponse>,
    failures: HashMap<String, FetchError>,
    slow: Option<(String, Duration)>,
    gets: Arc<Mutex<Vec<String>>>,
    probe_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockHttpClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    pub(crate) fn with_probe(mut self, url: &str, probe: ProbeResponse) -> Self {
        self.probes.insert(url.to_string(), probe);
        self
    }

    /// Makes every request to `url` fail with `error`
    pub(crate) fn with_failure(mut self, url: &str, error: FetchError) -> Self {
        self.failures.insert(url.to_string(), error);
        self
    }

    /// Delays GETs whose URL contains `marker` and tracks how many overlap
    pub(crate) fn with_slow_gets(mut self, marker: &str, delay: Duration) -> Self {
        self.slow = Some((marker.to_string(), delay));
        self
    }

    /// Every URL requested with GET, in request order
    pub(crate) fn get_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.gets.clone()
    }

    pub(crate) fn probe_count(&self) -> Arc<AtomicUsize> {
        self.probe_count.clone()
    }

    /// Highest number of slow GETs observed in flight at once
    pub(crate) fn max_in_flight(&self) -> Arc<AtomicUsize> {
        self.max_in_flight.clone()
    }

    fn lookup<T: Clone>(&self, url: &str, table: &HashMap<String, T>) -> Result<T, FetchError> {
        if let Some(error) = self.failures.get(url) {
            return Err(error.clone());
        }
        table.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<String, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled {
                url: url.to_string(),
            });
        }
        self.gets.lock().unwrap().push(url.to_string());

        if let Some((marker, delay)) = &self.slow {
            if url.contains(marker.as_str()) {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);

                let cancelled = tokio::select! {
                    _ = tokio::time::sleep(*delay) => false,
                    _ = cancel.cancelled() => true,
                };

                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                if cancelled {
                    return Err(FetchError::Cancelled {
                        url: url.to_string(),
                    });
                }
            }
        }

        self.lookup(url, &self.pages)
    }

    async fn probe(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ProbeResponse, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled {
                url: url.to_string(),
            });
        }
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        self.lookup(url, &self.probes)
    }
}

/// Builds a listing page from `(href, published millis)` entries
pub(crate) fn listing_html(entries: &[(&str, i64)], next: Option<&str>) -> String {
    let mut html = String::from("<html><body><section>");
    for (href, millis) in entries {
        html.push_str(&format!(
            r#"<div class="fc-item"><a data-link-name="article" href="{}">Episode</a><time data-timestamp="{}"></time></div>"#,
            href, millis
        ));
    }
    html.push_str("</section>");
    if let Some(next) = next {
        html.push_str(&format!(
            r#"<div class="pagination"><a rel="next" href="{}">Next</a></div>"#,
            next
        ));
    }
    html.push_str("</body></html>");
    html
}

/// Builds a detail page with a headline, publish time, and optional media URL
pub(crate) fn detail_html(title: &str, millis: i64, media_url: Option<&str>) -> String {
    let player = media_url
        .map(|url| {
            format!(
                r#"<figure id="audio-component-container" data-media-id="gu-audio-{}" data-duration="60" data-download-url="{}"></figure>"#,
                millis, url
            )
        })
        .unwrap_or_default();

    format!(
        r#"<html><head></head><body><div id="article"><h1 itemprop="headline">{} – podcast</h1><time itemprop="datePublished" data-timestamp="{}"></time>{}</div></body></html>"#,
        title, millis, player
    )
}
