//! Data carried through a crawl
//!
//! # Components
//!
//! - `ListItem`: a reference found on a listing page
//! - `Item` and `Enclosure`: the metadata fetched for one detail page
//! - `CrawlState`: the inputs, results, and cutoff of one run

mod crawl_state;
mod item;

// Re-export main types
pub use crawl_state::CrawlState;
pub use item::{Enclosure, Item, ListItem};
