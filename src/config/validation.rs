use crate::config::types::{Config, CrawlerConfig, HttpConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on simultaneous detail fetches
const MAX_CONCURRENCY: usize = 100;

/// Upper bound on listing pages walked per run
const MAX_PAGE_LIMIT: usize = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates crawler configuration
///
/// Zero page limits and concurrency are accepted here; a run coerces them
/// to 1 before it starts.
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_source_url(&config.source_url)?;

    if config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be at most {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.page_limit > MAX_PAGE_LIMIT {
        return Err(ConfigError::Validation(format!(
            "page_limit must be at most {}, got {}",
            MAX_PAGE_LIMIT, config.page_limit
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates that the source is an absolute HTTP(S) URL
fn validate_source_url(source_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(source_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid source URL '{}': {}", source_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Source URL '{}' must use HTTP or HTTPS",
            source_url
        )));
    }

    Ok(())
}
