//! Best-effort enclosure resolution
//!
//! An item's media reference is probed with a HEAD request to learn its
//! content type and size. The probe never fails the item: the caller receives
//! either a resolved enclosure or nothing, plus the failure as a diagnostic it
//! is free to log and drop.

use crate::crawler::fetcher::HttpClient;
use crate::state::Enclosure;
use crate::FetchError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Outcome of probing one media URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosureResolution {
    /// The resolved enclosure, absent when the probe failed
    pub enclosure: Option<Enclosure>,

    /// Why the probe failed; safe to ignore
    pub diagnostic: Option<FetchError>,
}

/// Probes media URLs for their type and size
#[derive(Clone)]
pub struct EnclosureResolver {
    client: Arc<dyn HttpClient>,
}

impl EnclosureResolver {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// Resolves the enclosure behind `media_url`
    ///
    /// Missing `Content-Type` or `Content-Length` headers leave the matching
    /// field empty; only a failed request drops the enclosure.
    pub async fn resolve(&self, media_url: &str, cancel: &CancellationToken) -> EnclosureResolution {
        match self.client.probe(media_url, cancel).await {
            Ok(probe) => EnclosureResolution {
                enclosure: Some(Enclosure {
                    url: media_url.to_string(),
                    mime_type: probe.content_type.unwrap_or_default(),
                    size_bytes: probe.content_length.unwrap_or(0),
                }),
                diagnostic: None,
            },
            Err(e) => EnclosureResolution {
                enclosure: None,
                diagnostic: Some(e),
            },
        }
    }
}
