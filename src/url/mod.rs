//! URL handling for listing and detail pages
//!
//! Listing pages reference items with relative or decorated links. This module
//! resolves them against the page they came from and reduces them to a stable
//! key so that the same item reached through two listing pages is fetched once.

use url::Url;

/// Query parameters that never change which item a URL points at
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "CMP",
];

/// Resolves a link href against the page it was found on
///
/// Returns None if the link should be ignored:
/// - empty or fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - anything that is not HTTP(S) after resolution
///
/// # Examples
///
/// ```
/// use tallr::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/series/podcast").unwrap();
/// assert_eq!(
///     resolve_link("/audio/2024/may/01/episode", &base).as_deref(),
///     Some("https://example.com/audio/2024/may/01/episode")
/// );
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url.to_string())
    } else {
        None
    }
}

/// Reduces an item URL to the key used for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL (host is lowercased and dot segments removed by the parser)
/// 2. Remove the fragment
/// 3. Remove tracking query parameters and sort the rest
/// 4. Remove a trailing slash, except for the root path
///
/// A URL that cannot be parsed is keyed by its trimmed text.
///
/// # Examples
///
/// ```
/// use tallr::url::dedup_key;
///
/// assert_eq!(
///     dedup_key("https://EXAMPLE.com/episode/?utm_source=rss#player"),
///     "https://example.com/episode"
/// );
/// ```
pub fn dedup_key(url_str: &str) -> String {
    let mut url = match Url::parse(url_str.trim()) {
        Ok(url) => url,
        Err(_) => return url_str.trim().to_string(),
    };

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    }

    url.to_string()
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
