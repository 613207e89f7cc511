//! Configuration module for Tallr
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use tallr::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tallr.toml")).unwrap();
//! println!("Crawling {}", config.crawler.source_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, HttpConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

// Re-export validation for configs assembled outside a file
pub use validation::validate;
