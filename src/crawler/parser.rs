//! HTML parsing for listing and detail pages
//!
//! The crawler only depends on the [`PageParser`] trait. [`HtmlPageParser`] is
//! the default implementation for series listings in the Guardian's podcast
//! markup.
//!
//! A parser distinguishes two kinds of failure:
//! - the page's structural anchor is missing → `ParseError`, the page is unusable
//! - a single field is missing or malformed → the field keeps its empty value

use crate::state::{Enclosure, Item, ListItem};
use crate::url::resolve_link;
use crate::ParseError;
use chrono::{DateTime, TimeZone, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Items and pagination extracted from one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// References in the order they appear on the page
    pub items: Vec<ListItem>,

    /// Absolute URL of the next listing page, if there is one
    pub next_page_url: Option<String>,
}

/// Site-specific extraction of listing and detail pages
pub trait PageParser: Send + Sync {
    /// Extracts item references and the next-page link from a listing page
    fn parse_listing(&self, raw: &str, page_url: &Url) -> Result<ListPage, ParseError>;

    /// Extracts item metadata from a detail page
    ///
    /// The returned item's enclosure, when present, only carries its URL; the
    /// item fetcher resolves the rest.
    fn parse_item_detail(&self, raw: &str, item_url: &Url) -> Result<Item, ParseError>;
}

/// Prefix of the ad-insertion redirector placed in front of media URLs
const REDIRECTOR_PREFIX: &str = "https://flex.acast.com/";

/// Title suffix appended to every episode headline
const TITLE_SUFFIX: &str = " – podcast";

/// Media id prefix stripped to obtain the GUID
const MEDIA_ID_PREFIX: &str = "gu-audio-";

/// Default parser for series listings and episode pages
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPageParser;

impl HtmlPageParser {
    pub fn new() -> Self {
        Self
    }
}

impl PageParser for HtmlPageParser {
    /// # Extraction Rules
    ///
    /// - Anchor: at least one `<section>` element
    /// - Items: each `section .fc-item` entry yields the `href` of its
    ///   `a[data-link-name=article]` and the millisecond `data-timestamp` of
    ///   its `<time>`; repeated URLs keep their first position
    /// - Next page: `.pagination a[rel=next]`
    fn parse_listing(&self, raw: &str, page_url: &Url) -> Result<ListPage, ParseError> {
        let document = Html::parse_document(raw);

        if !has_element(&document, "section") {
            return Err(ParseError::MissingAnchor {
                url: page_url.to_string(),
                anchor: "section",
            });
        }

        Ok(ListPage {
            items: extract_list_items(&document, page_url),
            next_page_url: extract_next_page_url(&document, page_url),
        })
    }

    fn parse_item_detail(&self, raw: &str, item_url: &Url) -> Result<Item, ParseError> {
        let document = Html::parse_document(raw);

        let article = match single_element(document.root_element(), "#article") {
            Some(article) => article,
            None => {
                return Err(ParseError::MissingAnchor {
                    url: item_url.to_string(),
                    anchor: "#article",
                })
            }
        };

        let mut item = Item::empty(item_url.as_str());
        item.keywords = extract_keywords(&document).unwrap_or_default();
        item.title = extract_title(article).unwrap_or_default();
        item.description = extract_description(article).unwrap_or_default();
        item.published_at =
            extract_published_at(article).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        extract_audio(article, &mut item);

        Ok(item)
    }
}

/// Returns true if the document contains an element matching `css`
fn has_element(document: &Html, css: &str) -> bool {
    Selector::parse(css)
        .map(|selector| document.select(&selector).next().is_some())
        .unwrap_or(false)
}

/// Returns the element matching `css` if there is exactly one
fn single_element<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    let mut matches = scope.select(&selector);
    match (matches.next(), matches.next()) {
        (Some(element), None) => Some(element),
        _ => None,
    }
}

/// Extracts item references in page order
fn extract_list_items(document: &Html, page_url: &Url) -> Vec<ListItem> {
    let (Ok(entry_selector), Ok(link_selector), Ok(time_selector)) = (
        Selector::parse("section .fc-item"),
        Selector::parse("a[data-link-name=article][href]"),
        Selector::parse("time[data-timestamp]"),
    ) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for entry in document.select(&entry_selector) {
        let Some(url) = entry
            .select(&link_selector)
            .next()
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| resolve_link(href, page_url))
        else {
            continue;
        };

        if !seen.insert(url.clone()) {
            continue;
        }

        let published_at = entry
            .select(&time_selector)
            .next()
            .and_then(|time| time.value().attr("data-timestamp"))
            .and_then(parse_millis)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        items.push(ListItem { url, published_at });
    }

    items
}

/// Extracts the absolute URL of the next listing page
fn extract_next_page_url(document: &Html, page_url: &Url) -> Option<String> {
    let selector = Selector::parse(".pagination a[rel=next][href]").ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|link| link.value().attr("href"))
        .and_then(|href| resolve_link(href, page_url))
}

/// Extracts the article tags as a `", "` separated list
fn extract_keywords(document: &Html) -> Option<String> {
    let selector = Selector::parse("head meta[property='article:tag']").ok()?;
    let tags = document.select(&selector).next()?.value().attr("content")?;

    Some(
        tags.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Extracts the headline without its trailing series marker
fn extract_title(article: ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("h1[itemprop=headline]").ok()?;
    let text = article.select(&selector).next()?.text().collect::<String>();
    let text = text.trim();

    Some(text.strip_suffix(TITLE_SUFFIX).unwrap_or(text).to_string())
}

fn extract_description(article: ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("meta[itemprop=description]").ok()?;
    let content = article.select(&selector).next()?.value().attr("content")?;
    Some(content.trim().to_string())
}

fn extract_published_at(article: ElementRef<'_>) -> Option<DateTime<Utc>> {
    let selector = Selector::parse("time[itemprop=datePublished]").ok()?;
    let timestamp = article
        .select(&selector)
        .next()?
        .value()
        .attr("data-timestamp")?;
    parse_millis(timestamp)
}

/// Fills GUID, duration, and enclosure URL from the audio player element
fn extract_audio(article: ElementRef<'_>, item: &mut Item) {
    let Some(player) = single_element(article, "#audio-component-container") else {
        return;
    };
    let player = player.value();

    if let Some(media_id) = player.attr("data-media-id") {
        let media_id = media_id.trim();
        item.guid = media_id
            .strip_prefix(MEDIA_ID_PREFIX)
            .unwrap_or(media_id)
            .trim()
            .to_string();
    }

    item.duration = player
        .attr("data-duration")
        .and_then(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let download_url = player.attr("data-download-url").unwrap_or("").trim();
    if !download_url.is_empty() {
        item.enclosure = Some(Enclosure::unresolved(strip_redirector(download_url)));
    }
}

/// Parses a millisecond Unix timestamp attribute
fn parse_millis(value: &str) -> Option<DateTime<Utc>> {
    let millis = value.trim().parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

/// Removes the ad-insertion redirector so the probe hits the media host
fn strip_redirector(url: &str) -> String {
    match url.strip_prefix(REDIRECTOR_PREFIX) {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}
