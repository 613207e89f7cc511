//! Listing references and fetched items

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A reference to one item as it appears on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Absolute URL of the item's detail page
    pub url: String,

    /// Publish time shown on the listing (Unix epoch when missing)
    pub published_at: DateTime<Utc>,
}

/// A downloadable media asset referenced by an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enclosure {
    pub url: String,

    /// Content-Type reported by the media host (empty when unknown)
    pub mime_type: String,

    /// Content-Length reported by the media host (0 when unknown)
    pub size_bytes: u64,
}

impl Enclosure {
    /// Creates an enclosure that only knows its URL
    pub fn unresolved(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime_type: String::new(),
            size_bytes: 0,
        }
    }
}

/// Full metadata for one crawled detail page
///
/// Fields that could not be extracted are left at their empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub url: String,
    pub guid: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub duration: Option<Duration>,
    pub enclosure: Option<Enclosure>,

    /// Comma separated keyword tags
    pub keywords: String,
}

impl Item {
    /// Creates an item with every field at its empty value
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            guid: String::new(),
            title: String::new(),
            description: String::new(),
            published_at: DateTime::<Utc>::UNIX_EPOCH,
            duration: None,
            enclosure: None,
            keywords: String::new(),
        }
    }

    /// Returns true if the detail page carried a publish time
    pub fn has_published_at(&self) -> bool {
        self.published_at != DateTime::<Utc>::UNIX_EPOCH
    }

    /// Formats the duration as `HH:MM:SS`, or an empty string when unknown
    pub fn duration_hms(&self) -> String {
        match self.duration {
            Some(duration) => {
                let secs = duration.as_secs();
                format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
            }
            None => String::new(),
        }
    }
}
